//! Synthetic purchaser identity and payment data

use chrono::Datelike;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::random::Randomizer;
use crate::Result;

/// Card types accepted by the purchase form
pub const CARD_TYPE: &str = "amex";

/// Length of an American Express card number
pub const CARD_NUMBER_LEN: usize = 15;

/// Form data for one purchase; regenerated for every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub card_type: String,
    pub card_number: String,
    pub card_month: String,
    pub card_year: String,
    pub name_on_card: String,
}

impl PurchaseRecord {
    /// Generate a fresh record with expiry relative to today
    pub fn generate<R: RngCore>(random: &mut Randomizer<R>) -> Result<Self> {
        Self::generate_for_year(random, chrono::Utc::now().year())
    }

    /// Generate a fresh record whose card expires after `current_year`
    pub fn generate_for_year<R: RngCore>(random: &mut Randomizer<R>, current_year: i32) -> Result<Self> {
        let name = format!("User{}", random.in_range(0..=999)?);
        let zip_code = random.in_range(10_000..=99_999)?.to_string();

        // Leading digit 3 keeps the number in the amex range
        let card_number = format!("3{}", random.digits(CARD_NUMBER_LEN - 1));
        let card_month = format!("{:02}", random.in_range(1..=12)?);
        let card_year = (i64::from(current_year) + random.in_range(1..=4)? as i64).to_string();

        Ok(Self {
            name_on_card: name.clone(),
            name,
            address: "123 Test Road".to_string(),
            city: "TestCity".to_string(),
            state: "TestState".to_string(),
            zip_code,
            card_type: CARD_TYPE.to_string(),
            card_number,
            card_month,
            card_year,
        })
    }
}
