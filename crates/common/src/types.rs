//! Core types for FlightPath

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Caller-supplied trip parameters, any of which may be left unset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    #[serde(default)]
    pub origin: Option<String>,

    #[serde(default)]
    pub destination: Option<String>,

    /// 1-based row on the flight listing
    #[serde(default)]
    pub flight_index: Option<usize>,
}

impl TripRequest {
    pub fn new(origin: Option<&str>, destination: Option<&str>, flight_index: Option<usize>) -> Self {
        Self {
            origin: origin.map(String::from),
            destination: destination.map(String::from),
            flight_index,
        }
    }

    /// Request with every parameter left to the randomizer
    pub fn random() -> Self {
        Self::default()
    }
}

/// A trip whose supplied fields passed validation; gaps are still open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub flight_index: Option<usize>,
}

/// Fully resolved origin and destination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedTrip {
    pub origin: String,
    pub destination: String,
}

impl fmt::Display for ResolvedTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.origin, self.destination)
    }
}

/// Result of a completed purchase journey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    pub price: f64,
    pub status_label: String,
    pub trip: ResolvedTrip,
    /// 1-based flight that was booked
    pub flight_index: usize,
    /// Number of flights that were listed
    pub flight_count: usize,
}

/// Per-run lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Validated,
    Navigated,
    Listed,
    FormFilled,
    Confirmed,
    Failed(String),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Confirmed | RunState::Failed(_))
    }

    /// Move to `next`, rejecting anything but the forward step or a failure
    pub fn advance(&self, next: RunState) -> Result<RunState> {
        let allowed = match (self, &next) {
            (RunState::Confirmed, _) | (RunState::Failed(_), _) => false,
            (_, RunState::Failed(_)) => true,
            (RunState::Idle, RunState::Validated)
            | (RunState::Validated, RunState::Navigated)
            | (RunState::Navigated, RunState::Listed)
            | (RunState::Listed, RunState::FormFilled)
            | (RunState::FormFilled, RunState::Confirmed) => true,
            _ => false,
        };

        if allowed {
            Ok(next)
        } else {
            Err(Error::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        RunState::Idle
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Validated => write!(f, "validated"),
            RunState::Navigated => write!(f, "navigated"),
            RunState::Listed => write!(f, "listed"),
            RunState::FormFilled => write!(f, "form_filled"),
            RunState::Confirmed => write!(f, "confirmed"),
            RunState::Failed(reason) => write!(f, "failed({})", reason),
        }
    }
}
