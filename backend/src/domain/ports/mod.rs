//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod bot_metrics;
mod callout_repository;
mod chat_transport;
mod contact_request_repository;
mod listing_repository;
mod location_history_repository;
mod outbound_queue;
mod timeline_repository;
mod user_repository;

#[cfg(test)]
pub use bot_metrics::MockBotMetrics;
pub use bot_metrics::{
    BotMetrics, BotMetricsError, DeliveryStatus, DispatchStatus, ListingEvent, NoOpBotMetrics,
    log_metrics_failure,
};
#[cfg(test)]
pub use callout_repository::MockCalloutRepository;
pub use callout_repository::{ADMIN_NEW_USER_CALLOUT, CalloutRepository, CalloutRepositoryError};
#[cfg(test)]
pub use chat_transport::MockChatTransport;
pub use chat_transport::{ChatTransport, ChatTransportError};
#[cfg(test)]
pub use contact_request_repository::MockContactRequestRepository;
pub use contact_request_repository::{ContactRequestRepository, ContactRequestRepositoryError};
#[cfg(test)]
pub use listing_repository::MockListingRepository;
pub use listing_repository::{HistoricalListingQuery, ListingRepository, ListingRepositoryError};
#[cfg(test)]
pub use location_history_repository::MockLocationHistoryRepository;
pub use location_history_repository::{LocationHistoryRepository, LocationHistoryRepositoryError};
#[cfg(test)]
pub use outbound_queue::MockOutboundQueue;
pub use outbound_queue::{ClaimedEnvelope, OutboundQueue, OutboundQueueError};
#[cfg(test)]
pub use timeline_repository::MockTimelineRepository;
pub use timeline_repository::{TimelineRepository, TimelineRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
