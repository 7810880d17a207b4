//! Telegram Bot API outbound adapter.
//!
//! [`TelegramBotClient`] implements the `ChatTransport` port and exposes
//! the generic [`TelegramBotClient::call`] used by the inbound long-poll
//! listener.

mod client;
mod dto;

pub use client::{DEFAULT_TELEGRAM_API_URL, TelegramBotClient, TelegramClientConfig};
