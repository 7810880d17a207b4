//! Port for one-off notices that must fire at most once per user.

use async_trait::async_trait;

use crate::domain::{Error, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by callout repository adapters.
    pub enum CalloutRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "callout repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "callout repository query failed: {message}",
    }
}

/// Callout fired when a new user finishes the welcome step.
pub const ADMIN_NEW_USER_CALLOUT: &str = "admin_channel_new_user_notification";

/// Port tracking which callouts a user has already triggered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalloutRepository: Send + Sync {
    /// Whether `feature` was already dismissed for the user.
    async fn is_dismissed(&self, user_id: UserId, feature: &str) -> Result<bool, CalloutRepositoryError>;

    /// Mark `feature` dismissed for the user. Repeated calls are no-ops.
    async fn dismiss(&self, user_id: UserId, feature: &str) -> Result<(), CalloutRepositoryError>;
}

impl From<CalloutRepositoryError> for Error {
    fn from(err: CalloutRepositoryError) -> Self {
        match err {
            CalloutRepositoryError::Connection { message } => Error::service_unavailable(message),
            CalloutRepositoryError::Query { message } => Error::internal(message),
        }
    }
}
