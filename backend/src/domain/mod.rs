//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed entities the bot persists, the
//! dialogue state machine that mutates them, and the fanout machinery that
//! announces listings to nearby users. Adapters live outside this module
//! and are reached only through [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: domain failure payload and its stable identifier.
//! - User, Listing, TimelineEntry, LocationHistoryEntry: persisted records.
//! - MenuState: the node of the per-user dialogue.
//! - Catalog: immutable localisation catalog.
//! - Envelope: priority-tagged unit of outbound work.
//! - SessionEngine: drives one inbound event through the dialogue.
//! - FanoutEngine / FanoutDispatcher: live and historical listing broadcast.
//! - DeliveryWorker: rate-limited consumer of the outbound queue.

pub mod callback;
pub mod contact_request;
pub mod delivery_worker;
pub mod error;
pub mod event;
pub mod fanout;
pub mod geo;
pub mod historical_trigger;
pub mod language;
pub mod listing;
pub mod localization;
pub mod location_history;
pub mod menu_state;
pub mod outbound;
pub mod ports;
pub mod session;
pub mod time_ago;
pub mod timeline;
pub mod trace_id;
pub mod user;

pub use self::callback::{
    AMOUNT_OPTIONS_USD, CallbackAction, CallbackParseError, ListingAction, RADIUS_OPTIONS_KM,
};
pub use self::contact_request::{ContactRequestOutcome, NewContactRequest};
pub use self::delivery_worker::{
    BackoffJitter, DeliveryOutcome, DeliveryPorts, DeliveryRuntime, DeliverySleeper,
    DeliveryWorker, DeliveryWorkerConfig, RandomJitter, TokioSleeper, extract_status_code,
};
pub use self::error::{Error, ErrorCode};
pub use self::event::{CallbackEvent, CallbackOrigin, InboundEvent, MessageEvent};
pub use self::fanout::{
    FanoutDispatcher, FanoutEngine, FanoutJob, FanoutPorts, FanoutReport, FanoutScheduler,
};
pub use self::geo::{GeoPoint, GeoPointError, haversine_km, rounded_km};
pub use self::historical_trigger::HistoricalTrigger;
pub use self::language::{
    LANGUAGES, Language, english_name, find_language, native_name, resolve_language,
};
pub use self::listing::{
    Direction, Listing, ListingDraft, ListingId, ListingStatus, ListingTransitionError, NewListing,
    UnknownLabel,
};
pub use self::localization::{Catalog, CatalogError};
pub use self::location_history::{LocationHistoryEntry, should_trigger};
pub use self::menu_state::{MenuState, UnknownMenuState};
pub use self::outbound::{
    CallbackAnswer, ChatId, Envelope, FanoutKind, InlineButton, InlineRows, Keyboard,
    ListingNotification, MessageEdit, MessageId, OutgoingMessage, ParseMode, Payload, Priority,
    ReplyButton, ReplyRequest,
};
pub use self::session::{SessionConfig, SessionEngine, SessionPorts};
pub use self::time_ago::{TimeAgo, time_ago};
pub use self::timeline::{NewTimelineEntry, TimelineEntry, TimelineStatus};
pub use self::trace_id::TraceId;
pub use self::user::{DEFAULT_LANGUAGE, SenderProfile, User, UserDraft, UserId};
