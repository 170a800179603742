//! Suite runner: lifecycle hooks, per-run sessions, artifacts and results

use chrono::{DateTime, Utc};
use flightpath_common::{FlowConfig, Randomizer, RouteCatalog, RunOutcome, RunState};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::browser::SessionFactory;
use crate::capture::{ArtifactCapture, Artifacts};
use crate::error::{E2eError, E2eResult};
use crate::preflight::wait_until_reachable;
use crate::scenario::{Expectation, Scenario};
use crate::stages::Stages;
use crate::workflow::Workflow;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub title: String,
    /// Whether the actual outcome matched the expectation
    pub passed: bool,
    pub expected: Expectation,
    pub actual: Expectation,
    /// Seed of the run's randomizer; replaying it reproduces the run
    pub seed: u64,
    pub final_state: RunState,
    pub outcome: Option<RunOutcome>,
    pub error: Option<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Artifacts::is_empty")]
    pub artifacts: Artifacts,
}

/// Result of running a whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub target: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Runs scenarios one after another, each in a fresh session
pub struct SuiteRunner {
    config: FlowConfig,
    catalog: RouteCatalog,
    stages: Stages,
    capture: ArtifactCapture,
    factory: Box<dyn SessionFactory>,
    seeds: Randomizer,
    results_dir: PathBuf,
}

impl SuiteRunner {
    /// Runner for `config`, using the catalog it names
    pub fn new(config: FlowConfig, factory: Box<dyn SessionFactory>) -> E2eResult<Self> {
        let catalog = config.catalog()?;
        Ok(Self::with_catalog(config, catalog, factory))
    }

    pub fn with_catalog(config: FlowConfig, catalog: RouteCatalog, factory: Box<dyn SessionFactory>) -> Self {
        Self {
            stages: Stages::from_config(&config),
            capture: ArtifactCapture::from_config(&config.artifacts),
            results_dir: config.artifacts.results_dir.clone(),
            seeds: Randomizer::from_entropy(),
            catalog,
            factory,
            config,
        }
    }

    /// Seed for the run at `ordinal`: derived from the configured seed, or fresh
    fn seed_for(&mut self, ordinal: usize) -> u64 {
        match self.config.seed {
            Some(seed) => seed.wrapping_add(ordinal as u64),
            None => self.seeds.fork_seed(),
        }
    }

    /// Run a list of scenarios
    pub async fn run_all(&mut self, scenarios: &[Scenario]) -> E2eResult<SuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();

        if self.factory.is_remote() {
            wait_until_reachable(&self.config.base_url, self.config.timeouts.preflight()).await?;
        }

        info!("BEFORE ALL: running {} scenario(s) against {}", scenarios.len(), self.config.base_url);

        let mut results = Vec::with_capacity(scenarios.len());
        for (ordinal, scenario) in scenarios.iter().enumerate() {
            let result = self.run_scenario(scenario, ordinal).await.map_err(|e| {
                error!("✗ {} - harness failure, stopping the suite: {}", scenario.title, e);
                e
            })?;
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.passed).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "AFTER ALL: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(SuiteResult {
            started_at,
            target: self.config.base_url.clone(),
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Run one scenario in its own session.
    ///
    /// Only harness failures (the session could not be opened) are returned
    /// as errors, and they abort [`run_all`](Self::run_all). A journey that
    /// fails is a result.
    pub async fn run_scenario(&mut self, scenario: &Scenario, ordinal: usize) -> E2eResult<ScenarioResult> {
        let start = Instant::now();
        let seed = self.seed_for(ordinal);
        info!("STARTING TEST → {}", scenario.title);
        debug!("Seed for {}: {}", scenario.title, seed);

        let mut session = self.factory.open().await?;
        if let Err(e) = self.capture.begin(session.as_mut()).await {
            warn!("Could not start tracing for {}: {}", scenario.title, e);
        }

        let request = scenario.request();
        let run_timeout = self.config.timeouts.run();
        let mut workflow = Workflow::new(&self.catalog, &self.stages, Randomizer::seeded(seed));

        let result = match tokio::time::timeout(run_timeout, workflow.run(session.as_mut(), &request)).await {
            Ok(result) => result,
            Err(_) => Err(E2eError::Timeout(run_timeout.as_millis() as u64)),
        };

        let actual = Expectation::observed(&result);
        let passed = actual == scenario.expect;

        let artifacts = self.capture.finish(session.as_mut(), &scenario.title, !passed).await;
        if let Err(e) = session.close().await {
            warn!("Closing session for {} failed: {}", scenario.title, e);
        }

        let final_state = match (&result, workflow.state()) {
            (Err(e), state) if !state.is_terminal() => RunState::Failed(e.to_string()),
            (_, state) => state.clone(),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        if passed {
            info!("✓ {} ({} ms)", scenario.title, duration_ms);
        } else {
            error!("✗ {} - expected {}, got {}", scenario.title, scenario.expect, actual);
        }
        info!("FINISHED TEST → {}", scenario.title);

        let (outcome, error) = match result {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => (None, Some(e.to_string())),
        };

        Ok(ScenarioResult {
            title: scenario.title.clone(),
            passed,
            expected: scenario.expect,
            actual,
            seed,
            final_state,
            outcome,
            error,
            duration_ms,
            artifacts,
        })
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.results_dir, results)
    }
}

/// Write `results` as `test-results.json` under `dir`
pub fn write_results(dir: &Path, results: &SuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = dir.join("test-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}
