//! Source of Bot API updates.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::dto::UpdateDto;
use crate::domain::ports::ChatTransportError;
use crate::outbound::telegram::TelegramBotClient;

/// Grace period on top of the long-poll timeout before the HTTP call gives up.
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Pull-based update source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpdateFeed: Send + Sync {
    /// Updates with `update_id >= offset`, waiting up to `timeout` for the
    /// first one.
    async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<UpdateDto>, ChatTransportError>;
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 2],
}

#[async_trait]
impl UpdateFeed for TelegramBotClient {
    async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<UpdateDto>, ChatTransportError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: ["message", "callback_query"],
        };
        self.call("getUpdates", &request, Some(timeout + LONG_POLL_GRACE))
            .await
    }
}
