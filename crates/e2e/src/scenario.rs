//! Declarative journey scenarios (YAML)

use flightpath_common::{ErrorKind, TripRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// What a scenario expects from its run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    #[default]
    Success,
    Error(ErrorKind),
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Success => write!(f, "success"),
            Expectation::Error(kind) => write!(f, "error:{}", kind),
        }
    }
}

impl Expectation {
    /// Expectation a run actually met
    pub fn observed<T>(result: &E2eResult<T>) -> Self {
        match result {
            Ok(_) => Expectation::Success,
            Err(e) => Expectation::Error(e.kind()),
        }
    }
}

/// One journey to run, parsed from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique title; also names the failure artifacts
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Omitted parameters are drawn at random
    #[serde(default)]
    pub origin: Option<String>,

    #[serde(default)]
    pub destination: Option<String>,

    /// 1-based row of the flight listing
    #[serde(default)]
    pub flight_index: Option<usize>,

    #[serde(default)]
    pub expect: Expectation,
}

impl Scenario {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            origin: None,
            destination: None,
            flight_index: None,
            expect: Expectation::Success,
        }
    }

    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    /// Load every `.yaml`/`.yml` file under `dir`, sorted by path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(E2eError::ScenarioParse(format!(
                "scenario directory {} not found",
                dir.display()
            )));
        }

        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            scenarios.push(Self::from_file(entry.path())?);
        }

        Ok(scenarios)
    }

    /// The purchase journey suite: one happy path, one random run, three rejections
    pub fn builtin_suite() -> Vec<Self> {
        let mut valid = Self::new("Valid Flight Purchase — Boston → Berlin");
        valid.origin = Some("Boston".to_string());
        valid.destination = Some("Berlin".to_string());
        valid.flight_index = Some(1);
        valid.tags = vec!["smoke".to_string()];

        let mut random = Self::new("Random Flight Purchase — All parameters random");
        random.tags = vec!["random".to_string()];

        let mut same = Self::new("Negative — Same Cities");
        same.origin = Some("Paris".to_string());
        same.destination = Some("Paris".to_string());
        same.expect = Expectation::Error(ErrorKind::SameCity);
        same.tags = vec!["negative".to_string()];

        let mut bad_origin = Self::new("Negative — Invalid Departure City");
        bad_origin.origin = Some("London".to_string());
        bad_origin.destination = Some("Berlin".to_string());
        bad_origin.expect = Expectation::Error(ErrorKind::InvalidOrigin);
        bad_origin.tags = vec!["negative".to_string()];

        let mut bad_destination = Self::new("Negative — Invalid Destination City");
        bad_destination.origin = Some("Boston".to_string());
        bad_destination.destination = Some("Tokyo".to_string());
        bad_destination.expect = Expectation::Error(ErrorKind::InvalidDestination);
        bad_destination.tags = vec!["negative".to_string()];

        vec![valid, random, same, bad_origin, bad_destination]
    }

    pub fn request(&self) -> TripRequest {
        TripRequest::new(self.origin.as_deref(), self.destination.as_deref(), self.flight_index)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.has_tag(tag)).collect()
    }
}
