//! Flight listing page

use flightpath_common::{select_flight, Error as RuleError, Randomizer};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::selectors;
use crate::browser::{Browser, WaitState};
use crate::error::{E2eError, E2eResult};

/// Flight that was booked out of the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightChoice {
    /// 1-based row
    pub index: usize,
    /// Rows that were listed
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct FlightsStage {
    listing_timeout: Duration,
}

impl FlightsStage {
    pub fn new(listing_timeout: Duration) -> Self {
        Self { listing_timeout }
    }

    /// Wait for the listing, pick a row and book it.
    ///
    /// A listing that never shows a row within the listing timeout counts as
    /// having no flights.
    pub async fn choose<R: RngCore + Send>(
        &self,
        session: &mut dyn Browser,
        requested: Option<usize>,
        random: &mut Randomizer<R>,
    ) -> E2eResult<FlightChoice> {
        let rows = selectors::flight_rows();

        match session
            .wait_for(&rows.clone().nth(0), WaitState::Visible, self.listing_timeout)
            .await
        {
            Ok(()) => {}
            Err(E2eError::StageTimeout { .. }) => return Err(RuleError::NoFlightsAvailable.into()),
            Err(e) => return Err(e),
        }

        let total = session.count(&rows).await?;
        debug!("{} flight(s) listed", total);

        let index = select_flight(requested, total, random)?;
        info!("Selecting flight #{} of {}", index, total);
        session.click(&selectors::flight_button(index - 1)).await?;

        Ok(FlightChoice { index, total })
    }
}
