//! Error types for journey runs

use flightpath_common::{Error as RuleError, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    /// A journey rule fired; the inner kind is preserved as-is
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("Timeout after {timeout_ms} ms waiting for: {what}")]
    StageTimeout { what: String, timeout_ms: u64 },

    #[error("Run exceeded {0} ms")]
    Timeout(u64),

    #[error("Status mismatch: expected {expected:?}, found {actual:?}")]
    StatusMismatch { expected: String, actual: String },

    #[error("Playwright not found. Install with: npm i playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Simulated target: {0}")]
    Simulation(String),

    #[error("Target {url} unreachable after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// The journey rule behind this error, if any
    pub fn rule(&self) -> Option<&RuleError> {
        match self {
            E2eError::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    /// Stable kind used to match scenario expectations
    pub fn kind(&self) -> ErrorKind {
        match self {
            E2eError::Rule(rule) => rule.kind(),
            E2eError::StageTimeout { .. } => ErrorKind::StageTimeout,
            E2eError::Timeout(_) => ErrorKind::Timeout,
            E2eError::StatusMismatch { .. } => ErrorKind::StatusMismatch,
            E2eError::PlaywrightNotFound | E2eError::Playwright(_) | E2eError::Simulation(_) => {
                ErrorKind::Browser
            }
            E2eError::TargetUnreachable { .. }
            | E2eError::ScenarioParse(_)
            | E2eError::Io(_)
            | E2eError::Json(_)
            | E2eError::Yaml(_)
            | E2eError::Http(_) => ErrorKind::Internal,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
