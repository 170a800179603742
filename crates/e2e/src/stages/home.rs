//! Origin/destination search page

use flightpath_common::ResolvedTrip;
use tracing::debug;

use super::selectors;
use crate::browser::Browser;
use crate::error::E2eResult;

/// Entry page: pick departure and destination, then search
#[derive(Debug, Clone)]
pub struct HomeStage {
    base_url: String,
}

impl HomeStage {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }

    /// Navigate to the site and submit the search for `trip`
    pub async fn open(&self, session: &mut dyn Browser, trip: &ResolvedTrip) -> E2eResult<()> {
        debug!("Opening {}", self.base_url);
        session.goto(&self.base_url).await?;

        debug!("Searching flights {}", trip);
        session.select_option(&selectors::from_port(), &trip.origin).await?;
        session.select_option(&selectors::to_port(), &trip.destination).await?;
        session.click(&selectors::find_flights()).await?;
        Ok(())
    }
}
