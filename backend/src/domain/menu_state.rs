//! Dialogue states a user moves through.
//!
//! Codes are persisted as integers and must stay stable: they are ordered so
//! that comparisons between states are deterministic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Node in the per-user dialogue state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuState {
    /// Jurisdiction question asked before anything else.
    ComplianceCheck,
    /// Terminal state for users who declared a restricted jurisdiction.
    Blocked,
    /// Welcome and one-off onboarding side effects.
    Init,
    /// Waiting for a location message.
    AskLocation,
    /// Waiting for a search radius choice.
    SelectRadius,
    /// Waiting for a shared phone number or an explicit skip.
    AskPhone,
    /// Decides whether historical listings should be replayed.
    HistoricalFanoutExecute,
    /// Historical listings were sent; waiting for the continue button.
    HistoricalFanoutWait,
    /// Idle menu offering the two exchange directions.
    Main,
    /// Waiting for the amount of a freshly initiated listing.
    Amount,
}

/// Raised when a stored integer does not name a known state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown menu state code {0}")]
pub struct UnknownMenuState(pub i32);

impl MenuState {
    /// State assigned to users seen for the first time.
    pub const BOOTSTRAP: Self = Self::ComplianceCheck;

    /// Persisted integer code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ComplianceCheck => 50,
            Self::Blocked => 60,
            Self::Init => 100,
            Self::AskLocation => 200,
            Self::SelectRadius => 250,
            Self::AskPhone => 275,
            Self::HistoricalFanoutExecute => 290,
            Self::HistoricalFanoutWait => 295,
            Self::Main => 400,
            Self::Amount => 500,
        }
    }

    /// Decode a persisted integer code.
    ///
    /// # Errors
    /// Returns [`UnknownMenuState`] for codes that name no state.
    pub const fn from_code(code: i32) -> Result<Self, UnknownMenuState> {
        Ok(match code {
            50 => Self::ComplianceCheck,
            60 => Self::Blocked,
            100 => Self::Init,
            200 => Self::AskLocation,
            250 => Self::SelectRadius,
            275 => Self::AskPhone,
            290 => Self::HistoricalFanoutExecute,
            295 => Self::HistoricalFanoutWait,
            400 => Self::Main,
            500 => Self::Amount,
            other => return Err(UnknownMenuState(other)),
        })
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ComplianceCheck => "compliance_check",
            Self::Blocked => "blocked",
            Self::Init => "init",
            Self::AskLocation => "ask_location",
            Self::SelectRadius => "select_radius",
            Self::AskPhone => "ask_phone",
            Self::HistoricalFanoutExecute => "historical_fanout_execute",
            Self::HistoricalFanoutWait => "historical_fanout_wait",
            Self::Main => "main",
            Self::Amount => "amount",
        }
    }

    /// Every state, in code order.
    pub const ALL: [Self; 10] = [
        Self::ComplianceCheck,
        Self::Blocked,
        Self::Init,
        Self::AskLocation,
        Self::SelectRadius,
        Self::AskPhone,
        Self::HistoricalFanoutExecute,
        Self::HistoricalFanoutWait,
        Self::Main,
        Self::Amount,
    ];
}

impl fmt::Display for MenuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
