//! One handler per dialogue state, built once per engine.

use crate::domain::MenuState;

use super::handler::MenuHandler;

mod amount;
mod ask_location;
mod ask_phone;
mod blocked;
mod compliance;
mod historical;
mod init;
mod main_menu;
mod select_radius;

pub(crate) use amount::{cancel_listing, select_amount};
pub(crate) use historical::continue_outside_wait;
pub(crate) use main_menu::start_listing;

/// Exhaustive state-to-handler mapping.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    compliance: compliance::ComplianceHandler,
    blocked: blocked::BlockedHandler,
    init: init::InitHandler,
    select_radius: select_radius::SelectRadiusHandler,
    ask_location: ask_location::AskLocationHandler,
    ask_phone: ask_phone::AskPhoneHandler,
    historical_execute: historical::HistoricalExecuteHandler,
    historical_wait: historical::HistoricalWaitHandler,
    main: main_menu::MainMenuHandler,
    amount: amount::AmountHandler,
}

impl HandlerRegistry {
    pub(crate) fn get(&self, state: MenuState) -> &dyn MenuHandler {
        match state {
            MenuState::ComplianceCheck => &self.compliance,
            MenuState::Blocked => &self.blocked,
            MenuState::Init => &self.init,
            MenuState::SelectRadius => &self.select_radius,
            MenuState::AskLocation => &self.ask_location,
            MenuState::AskPhone => &self.ask_phone,
            MenuState::HistoricalFanoutExecute => &self.historical_execute,
            MenuState::HistoricalFanoutWait => &self.historical_wait,
            MenuState::Main => &self.main,
            MenuState::Amount => &self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(MenuState::ComplianceCheck)]
    #[case(MenuState::Blocked)]
    #[case(MenuState::Init)]
    #[case(MenuState::SelectRadius)]
    #[case(MenuState::AskLocation)]
    #[case(MenuState::AskPhone)]
    #[case(MenuState::HistoricalFanoutExecute)]
    #[case(MenuState::HistoricalFanoutWait)]
    #[case(MenuState::Main)]
    #[case(MenuState::Amount)]
    fn every_state_maps_to_its_own_handler(#[case] state: MenuState) {
        assert_eq!(HandlerRegistry::default().get(state).state(), state);
    }
}
