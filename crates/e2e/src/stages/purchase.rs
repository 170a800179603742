//! Purchase form and confirmation page

use flightpath_common::{parse_price, FlowConfig, PricePolicy, PurchaseRecord, Randomizer};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::selectors;
use crate::browser::{Browser, Locator, WaitState};
use crate::error::{E2eError, E2eResult};

/// Post-conditions read off the confirmation page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub status_label: String,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct PurchaseStage {
    heading: String,
    expected_status: String,
    price_row: usize,
    price_column: usize,
    price_policy: PricePolicy,
    confirmation_timeout: Duration,
}

impl PurchaseStage {
    pub fn from_config(config: &FlowConfig) -> Self {
        let policy = &config.policy;
        Self {
            heading: policy.confirmation_heading.clone(),
            expected_status: policy.expected_status.clone(),
            price_row: policy.price_row,
            price_column: policy.price_column,
            price_policy: policy.price_policy(),
            confirmation_timeout: config.timeouts.confirmation(),
        }
    }

    /// Generate a fresh purchase record, fill the form with it and place the order
    pub async fn submit<R: RngCore + Send>(
        &self,
        session: &mut dyn Browser,
        random: &mut Randomizer<R>,
    ) -> E2eResult<PurchaseRecord> {
        let record = PurchaseRecord::generate(random)?;
        self.fill_and_order(session, &record).await?;
        Ok(record)
    }

    /// Fill every required field from `record` and place the order
    pub async fn fill_and_order(&self, session: &mut dyn Browser, record: &PurchaseRecord) -> E2eResult<()> {
        debug!("Filling purchase form for {}", record.name);

        let input = |selector: &str| Locator::css(selector);
        session.fill(&input(selectors::INPUT_NAME), &record.name).await?;
        session.fill(&input(selectors::ADDRESS), &record.address).await?;
        session.fill(&input(selectors::CITY), &record.city).await?;
        session.fill(&input(selectors::STATE), &record.state).await?;
        session.fill(&input(selectors::ZIP_CODE), &record.zip_code).await?;
        session
            .select_option(&input(selectors::CARD_TYPE), &record.card_type)
            .await?;
        session.fill(&input(selectors::CARD_NUMBER), &record.card_number).await?;
        session.fill(&input(selectors::CARD_MONTH), &record.card_month).await?;
        session.fill(&input(selectors::CARD_YEAR), &record.card_year).await?;
        session.fill(&input(selectors::NAME_ON_CARD), &record.name_on_card).await?;

        session.check(&selectors::remember_me()).await?;
        session.click(&selectors::purchase_flight()).await?;
        Ok(())
    }

    /// Assert the confirmation page, in order: heading, status, price
    pub async fn confirm(&self, session: &mut dyn Browser) -> E2eResult<Confirmation> {
        session
            .wait_for(&selectors::heading(&self.heading), WaitState::Visible, self.confirmation_timeout)
            .await?;

        let status_label = self.read_status(session).await?;

        let price_cell = selectors::table_cell(self.price_row, self.price_column);
        let price_text = session.text_content(&price_cell).await?.unwrap_or_default();
        let price = parse_price(&price_text)?;
        self.price_policy.check(price)?;
        debug!("Confirmed price {} ({:?})", price, price_text.trim());

        Ok(Confirmation { status_label, price })
    }

    async fn read_status(&self, session: &mut dyn Browser) -> E2eResult<String> {
        let cell = selectors::cell_named(&self.expected_status);
        let mismatch = |actual: String| E2eError::StatusMismatch {
            expected: self.expected_status.clone(),
            actual,
        };

        match session
            .wait_for(&cell, WaitState::Visible, self.confirmation_timeout)
            .await
        {
            Ok(()) => {}
            Err(E2eError::StageTimeout { .. }) => return Err(mismatch("<missing>".to_string())),
            Err(e) => return Err(e),
        }

        let actual = session
            .text_content(&cell)
            .await?
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        if actual != self.expected_status {
            return Err(mismatch(actual));
        }
        Ok(actual)
    }
}
