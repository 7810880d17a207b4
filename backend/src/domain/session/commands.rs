//! Slash commands matched before state dispatch.

/// Global command recognised in any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Restart onboarding from the compliance question.
    Start,
    /// Jump back to radius and location selection.
    Location,
    /// Open the language picker.
    Language,
    /// Jump to the main menu once onboarding is complete.
    Exchange,
}

impl Command {
    /// Parse the leading command of a message.
    ///
    /// Matching ignores case, a `@botname` suffix and trailing arguments.
    pub(crate) fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let command = word.strip_prefix('/')?;
        let name = command.split_once('@').map_or(command, |(bare, _bot)| bare);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "location" => Some(Self::Location),
            "language" => Some(Self::Language),
            "exchange" => Some(Self::Exchange),
            _ => None,
        }
    }

    /// Metric label.
    pub(crate) const fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Location => "location",
            Self::Language => "language",
            Self::Exchange => "exchange",
        }
    }
}
