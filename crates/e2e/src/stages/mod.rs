//! Page-level stages of the purchase journey
//!
//! Each stage wraps one page of the booking site behind a single coarse
//! operation. Stages hold only configuration; the session is handed in by the
//! workflow on every call.

pub mod flights;
pub mod home;
pub mod purchase;

use flightpath_common::FlowConfig;

pub use flights::{FlightChoice, FlightsStage};
pub use home::HomeStage;
pub use purchase::{Confirmation, PurchaseStage};

/// The three stages of one journey, in the order they run
#[derive(Debug, Clone)]
pub struct Stages {
    pub home: HomeStage,
    pub flights: FlightsStage,
    pub purchase: PurchaseStage,
}

impl Stages {
    pub fn from_config(config: &FlowConfig) -> Self {
        Self {
            home: HomeStage::new(&config.base_url),
            flights: FlightsStage::new(config.timeouts.listing()),
            purchase: PurchaseStage::from_config(config),
        }
    }
}

/// Element addresses on the booking site
pub mod selectors {
    use crate::browser::Locator;

    pub fn from_port() -> Locator {
        Locator::css(r#"select[name="fromPort"]"#)
    }

    pub fn to_port() -> Locator {
        Locator::css(r#"select[name="toPort"]"#)
    }

    pub fn find_flights() -> Locator {
        Locator::role("button", "Find Flights")
    }

    /// Every row of the flight listing
    pub fn flight_rows() -> Locator {
        Locator::css("table tbody tr")
    }

    /// "Choose This Flight" button of the 0-based listing row
    pub fn flight_button(row: usize) -> Locator {
        flight_rows().nth(row).locate(Locator::any_role("button"))
    }

    pub const INPUT_NAME: &str = "#inputName";
    pub const ADDRESS: &str = "#address";
    pub const CITY: &str = "#city";
    pub const STATE: &str = "#state";
    pub const ZIP_CODE: &str = "#zipCode";
    pub const CARD_TYPE: &str = "#cardType";
    pub const CARD_NUMBER: &str = "#creditCardNumber";
    pub const CARD_MONTH: &str = "#creditCardMonth";
    pub const CARD_YEAR: &str = "#creditCardYear";
    pub const NAME_ON_CARD: &str = "#nameOnCard";

    /// Text inputs of the purchase form, in tab order
    pub const FORM_INPUTS: [&str; 9] = [
        INPUT_NAME,
        ADDRESS,
        CITY,
        STATE,
        ZIP_CODE,
        CARD_NUMBER,
        CARD_MONTH,
        CARD_YEAR,
        NAME_ON_CARD,
    ];

    pub fn remember_me() -> Locator {
        Locator::label("Remember me")
    }

    pub fn purchase_flight() -> Locator {
        Locator::role("button", "Purchase Flight")
    }

    pub fn heading(text: &str) -> Locator {
        Locator::role("heading", text)
    }

    pub fn cell_named(text: &str) -> Locator {
        Locator::role("cell", text)
    }

    /// Data cell `column` of confirmation table row `row`, both 0-based
    pub fn table_cell(row: usize, column: usize) -> Locator {
        Locator::css("table tr").nth(row).locate(Locator::css("td")).nth(column)
    }
}
