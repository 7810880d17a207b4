//! Port for the chat platform's send, edit and answer primitives.
//!
//! Only the delivery worker calls this port; every other component enqueues
//! envelopes instead.

use async_trait::async_trait;

use crate::domain::{CallbackAnswer, MessageEdit, MessageId, OutgoingMessage};

use super::define_port_error;

define_port_error! {
    /// Errors raised by chat transport adapters.
    pub enum ChatTransportError {
        /// The request never reached the platform or timed out.
        Transport { message: String } =>
            "chat transport request failed: {message}",
        /// The platform answered with an error status.
        Rejected { status: u16, message: String } =>
            "chat platform rejected the request: {status}: {message}",
        /// The platform's response could not be decoded.
        Decode { message: String } =>
            "chat platform response could not be decoded: {message}",
    }
}

impl ChatTransportError {
    /// Platform status code carried by the error, if any.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }
}

/// Port for performing chat operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a new message and return its handle.
    async fn send_message(&self, message: &OutgoingMessage) -> Result<MessageId, ChatTransportError>;

    /// Replace the text and keyboard of an earlier message.
    async fn edit_message(&self, edit: &MessageEdit) -> Result<(), ChatTransportError>;

    /// Acknowledge a button press.
    async fn answer_callback(&self, answer: &CallbackAnswer) -> Result<(), ChatTransportError>;
}
