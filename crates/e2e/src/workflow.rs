//! Journey orchestration: validate, fill gaps, then drive the stages in order

use flightpath_common::{
    resolve, validate, Randomizer, RouteCatalog, RunOutcome, RunState, TripRequest,
};
use rand::rngs::StdRng;
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::browser::Browser;
use crate::error::E2eResult;
use crate::stages::Stages;

/// One purchase journey.
///
/// A workflow is single-use: it owns the randomizer for its run and refuses
/// to run again once it reached a terminal state. Errors from any stage are
/// returned unchanged and no step is retried.
pub struct Workflow<'a, R: RngCore = StdRng> {
    catalog: &'a RouteCatalog,
    stages: &'a Stages,
    random: Randomizer<R>,
    state: RunState,
    history: Vec<RunState>,
}

impl<'a, R: RngCore + Send> Workflow<'a, R> {
    pub fn new(catalog: &'a RouteCatalog, stages: &'a Stages, random: Randomizer<R>) -> Self {
        Self {
            catalog,
            stages,
            random,
            state: RunState::Idle,
            history: vec![RunState::Idle],
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Every state the run went through, starting at `Idle`
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Run the journey on `session`
    pub async fn run(&mut self, session: &mut dyn Browser, request: &TripRequest) -> E2eResult<RunOutcome> {
        match self.drive(session, request).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!("Run failed in state {}: {}", self.state, e);
                if !self.state.is_terminal() {
                    self.enter(RunState::Failed(e.to_string()));
                }
                Err(e)
            }
        }
    }

    async fn drive(&mut self, session: &mut dyn Browser, request: &TripRequest) -> E2eResult<RunOutcome> {
        let validated = validate(self.catalog, request)?;
        let flight_index = validated.flight_index;
        let trip = resolve(self.catalog, validated, &mut self.random)?;
        self.advance(RunState::Validated)?;
        info!("Departure: {}, Destination: {}", trip.origin, trip.destination);

        self.stages.home.open(session, &trip).await?;
        self.advance(RunState::Navigated)?;

        let choice = self
            .stages
            .flights
            .choose(session, flight_index, &mut self.random)
            .await?;
        self.advance(RunState::Listed)?;

        let record = self.stages.purchase.submit(session, &mut self.random).await?;
        debug!("Ordered as {}", record.name);
        self.advance(RunState::FormFilled)?;

        let confirmation = self.stages.purchase.confirm(session).await?;
        self.advance(RunState::Confirmed)?;

        info!(
            "Completed flight: {}, flight #{}, price ${}",
            trip, choice.index, confirmation.price
        );

        Ok(RunOutcome {
            success: true,
            price: confirmation.price,
            status_label: confirmation.status_label,
            trip,
            flight_index: choice.index,
            flight_count: choice.total,
        })
    }

    fn advance(&mut self, next: RunState) -> E2eResult<()> {
        let next = self.state.advance(next)?;
        self.enter(next);
        Ok(())
    }

    fn enter(&mut self, next: RunState) {
        self.history.push(next.clone());
        self.state = next;
    }
}
