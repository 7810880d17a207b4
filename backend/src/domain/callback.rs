//! Callback payloads carried by inline buttons.
//!
//! Payloads are `<prefix>:<value>` with exactly one colon. The
//! `listing-action`, `contact-request`, `delete-listing` and `lang` formats
//! are shared with messages already sitting in users' chats and must not
//! change.

use std::fmt;
use std::str::FromStr;

use super::{Direction, ListingId, find_language};

/// Search radius options offered during onboarding, in kilometres.
pub const RADIUS_OPTIONS_KM: [u32; 3] = [5, 15, 50];

/// Listing amounts offered in the amount menu, in USD.
pub const AMOUNT_OPTIONS_USD: [u32; 7] = [5, 10, 15, 25, 50, 75, 100];

/// Choice offered by the main and amount menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingAction {
    /// Start a listing in the given direction.
    Start(Direction),
    /// Abandon the listing being built.
    Cancel,
}

/// Decoded callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `compliance:yes|no`.
    Compliance {
        /// Whether the user declared a restricted jurisdiction.
        restricted: bool,
    },
    /// `radius:<km>`.
    Radius(u32),
    /// `listing-action:cash_to_crypto|crypto_to_cash|cancel`.
    Listing(ListingAction),
    /// `listing-amount:<usd>`.
    Amount(u32),
    /// `historical-fanout:continue`.
    HistoricalContinue,
    /// `contact-request:<listingId>`.
    ContactRequest(ListingId),
    /// `delete-listing:<listingId>`.
    DeleteListing(ListingId),
    /// `lang:<code>`.
    Language(String),
}

/// Reasons a payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackParseError {
    /// Not `<prefix>:<value>` with exactly one colon.
    #[error("callback payload `{0}` is not prefix:value")]
    Shape(String),
    /// Prefix names no known action.
    #[error("unknown callback prefix `{0}`")]
    UnknownPrefix(String),
    /// Value is not valid for the prefix.
    #[error("invalid value `{value}` for callback prefix `{prefix}`")]
    Value {
        /// Callback prefix.
        prefix: String,
        /// Rejected value.
        value: String,
    },
}

const COMPLIANCE: &str = "compliance";
const RADIUS: &str = "radius";
const LISTING_ACTION: &str = "listing-action";
const LISTING_AMOUNT: &str = "listing-amount";
const HISTORICAL_FANOUT: &str = "historical-fanout";
const CONTACT_REQUEST: &str = "contact-request";
const DELETE_LISTING: &str = "delete-listing";
const LANG: &str = "lang";

impl FromStr for CallbackAction {
    type Err = CallbackParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.split(':');
        let (Some(prefix), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CallbackParseError::Shape(raw.to_owned()));
        };
        if prefix.is_empty() || value.is_empty() {
            return Err(CallbackParseError::Shape(raw.to_owned()));
        }

        let invalid = || CallbackParseError::Value {
            prefix: prefix.to_owned(),
            value: value.to_owned(),
        };

        match prefix {
            COMPLIANCE => match value {
                "yes" => Ok(Self::Compliance { restricted: true }),
                "no" => Ok(Self::Compliance { restricted: false }),
                _ => Err(invalid()),
            },
            RADIUS => value
                .parse()
                .ok()
                .filter(|km| RADIUS_OPTIONS_KM.contains(km))
                .map(Self::Radius)
                .ok_or_else(invalid),
            LISTING_ACTION => match value {
                "cancel" => Ok(Self::Listing(ListingAction::Cancel)),
                other => other
                    .parse::<Direction>()
                    .map(|direction| Self::Listing(ListingAction::Start(direction)))
                    .map_err(|_| invalid()),
            },
            LISTING_AMOUNT => value
                .parse()
                .ok()
                .filter(|usd| AMOUNT_OPTIONS_USD.contains(usd))
                .map(Self::Amount)
                .ok_or_else(invalid),
            HISTORICAL_FANOUT if value == "continue" => Ok(Self::HistoricalContinue),
            HISTORICAL_FANOUT => Err(invalid()),
            CONTACT_REQUEST => parse_listing_id(value)
                .map(Self::ContactRequest)
                .ok_or_else(invalid),
            DELETE_LISTING => parse_listing_id(value)
                .map(Self::DeleteListing)
                .ok_or_else(invalid),
            LANG => find_language(value)
                .map(|language| Self::Language(language.code.to_owned()))
                .ok_or_else(invalid),
            other => Err(CallbackParseError::UnknownPrefix(other.to_owned())),
        }
    }
}

fn parse_listing_id(value: &str) -> Option<ListingId> {
    value
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(ListingId::new)
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compliance { restricted } => {
                write!(f, "{COMPLIANCE}:{}", if *restricted { "yes" } else { "no" })
            }
            Self::Radius(km) => write!(f, "{RADIUS}:{km}"),
            Self::Listing(ListingAction::Start(direction)) => write!(f, "{LISTING_ACTION}:{direction}"),
            Self::Listing(ListingAction::Cancel) => write!(f, "{LISTING_ACTION}:cancel"),
            Self::Amount(usd) => write!(f, "{LISTING_AMOUNT}:{usd}"),
            Self::HistoricalContinue => write!(f, "{HISTORICAL_FANOUT}:continue"),
            Self::ContactRequest(id) => write!(f, "{CONTACT_REQUEST}:{id}"),
            Self::DeleteListing(id) => write!(f, "{DELETE_LISTING}:{id}"),
            Self::Language(code) => write!(f, "{LANG}:{code}"),
        }
    }
}
