//! Telegram long-poll driver.
//!
//! [`UpdateListener`] pulls updates from an [`UpdateFeed`], maps each one to
//! a domain [`InboundEvent`](crate::domain::InboundEvent) and hands it to the
//! session engine under a fresh trace id.

mod dto;
mod feed;
mod listener;

pub use dto::{CallbackQueryDto, ContactDto, LocationDto, MessageDto, UpdateDto, UserDto};
pub use feed::UpdateFeed;
pub use listener::{ListenerConfig, UpdateListener};
