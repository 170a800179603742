//! FlightPath E2E Journey Runner
//!
//! Drives a flight booking site through a full purchase journey and checks
//! the business outcome:
//! - Validates and completes trip requests against the route catalog
//! - Drives the site's pages through narrow stage objects
//! - Controls Playwright through a JSON-lines driver process, or runs against
//!   an in-process simulated site
//! - Captures a screenshot and trace whenever a run misses its expectation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SuiteRunner (Rust)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  run_all(scenarios)                                         │
//! │    ├── preflight: wait_until_reachable(base_url)            │
//! │    ├── factory.open() -> Box<dyn Browser>                   │
//! │    ├── capture.begin()                                      │
//! │    ├── Workflow::run(session, request) -> RunOutcome        │
//! │    │     ├── validate + resolve                             │
//! │    │     ├── HomeStage::open                                │
//! │    │     ├── FlightsStage::choose                           │
//! │    │     ├── PurchaseStage::submit                          │
//! │    │     └── PurchaseStage::confirm                         │
//! │    └── capture.finish() -> Artifacts                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Browser: PlaywrightSession | SimulatedSite                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod capture;
pub mod error;
pub mod playwright;
pub mod preflight;
pub mod runner;
pub mod scenario;
pub mod sim;
pub mod stages;
pub mod workflow;

pub use browser::{Browser, Locator, SessionFactory, WaitState};
pub use capture::{artifact_stem, ArtifactCapture, Artifacts};
pub use error::{E2eError, E2eResult};
pub use playwright::{PlaywrightConfig, PlaywrightLauncher, PlaywrightSession};
pub use runner::{ScenarioResult, SuiteResult, SuiteRunner};
pub use scenario::{Expectation, Scenario};
pub use sim::{SimConfig, SimLog, SimulatedSite, SimulatedSiteFactory};
pub use stages::Stages;
pub use workflow::Workflow;
