//! Change detector deciding when to replay historical listings to a user.

use std::sync::Arc;

use super::ports::LocationHistoryRepository;
use super::{Error, UserId, should_trigger};

/// Entries compared by the detector.
const COMPARED_ENTRIES: usize = 2;

/// Reads a user's radius/location history and applies [`should_trigger`].
#[derive(Clone)]
pub struct HistoricalTrigger {
    history: Arc<dyn LocationHistoryRepository>,
}

impl HistoricalTrigger {
    /// Build a trigger over the given history store.
    #[must_use]
    pub const fn new(history: Arc<dyn LocationHistoryRepository>) -> Self {
        Self { history }
    }

    /// Whether the user's latest radius or location change is material.
    ///
    /// # Errors
    /// Propagates history repository failures.
    pub async fn should_trigger(&self, user_id: UserId) -> Result<bool, Error> {
        let entries = self.history.latest(user_id, COMPARED_ENTRIES).await?;
        Ok(should_trigger(&entries))
    }
}
