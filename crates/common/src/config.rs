//! Journey configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::RouteCatalog;
use crate::price::PricePolicy;
use crate::{Error, Result};

/// Top-level configuration, usually read from `flightpath.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Entry point of the booking site
    pub base_url: String,

    /// Seed for reproducible runs; entropy when unset
    pub seed: Option<u64>,

    /// Route catalog file; the built-in catalog when unset
    pub catalog_path: Option<PathBuf>,

    pub timeouts: TimeoutConfig,

    pub policy: PolicyConfig,

    pub artifacts: ArtifactConfig,

    pub browser: BrowserConfig,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            base_url: "https://blazedemo.com".to_string(),
            seed: None,
            catalog_path: None,
            timeouts: TimeoutConfig::default(),
            policy: PolicyConfig::default(),
            artifacts: ArtifactConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

/// Upper bounds for every wait on the target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Single browser action (navigate, click, fill, select)
    pub action_ms: u64,

    /// First row of the flight listing becoming visible
    pub listing_ms: u64,

    /// Confirmation page assertions
    pub confirmation_ms: u64,

    /// Whole journey, enforced by the suite runner
    pub run_ms: u64,

    /// Target reachability check before a suite
    pub preflight_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            action_ms: 10_000,
            listing_ms: 5_000,
            confirmation_ms: 10_000,
            run_ms: 120_000,
            preflight_ms: 15_000,
        }
    }
}

impl TimeoutConfig {
    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn listing(&self) -> Duration {
        Duration::from_millis(self.listing_ms)
    }

    pub fn confirmation(&self) -> Duration {
        Duration::from_millis(self.confirmation_ms)
    }

    pub fn run(&self) -> Duration {
        Duration::from_millis(self.run_ms)
    }

    pub fn preflight(&self) -> Duration {
        Duration::from_millis(self.preflight_ms)
    }
}

/// Business-rule assertions on the confirmation page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Status the booking must report
    pub expected_status: String,

    /// Price must be strictly above this
    pub min_price: f64,

    pub confirmation_heading: String,

    /// Row of the confirmation table holding the price (0-based)
    pub price_row: usize,

    /// Cell within that row (0-based)
    pub price_column: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            expected_status: "PendingCapture".to_string(),
            min_price: 100.0,
            confirmation_heading: "Thank you for your purchase".to_string(),
            price_row: 3,
            price_column: 1,
        }
    }
}

impl PolicyConfig {
    pub fn price_policy(&self) -> PricePolicy {
        PricePolicy::new(self.min_price)
    }
}

/// Where failure artifacts and results are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub screenshot_dir: PathBuf,
    pub trace_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: PathBuf::from("screenshots"),
            trace_dir: PathBuf::from("traces"),
            results_dir: PathBuf::from("test-results"),
        }
    }
}

/// Browser launch options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// chromium, firefox or webkit
    pub kind: String,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Interpreter used to run the driver script
    pub node_binary: PathBuf,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: "chromium".to_string(),
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
        }
    }
}

impl FlowConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values no run could succeed with
    pub fn check(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::InvalidConfig("base_url is empty".to_string()));
        }
        if !self.policy.min_price.is_finite() {
            return Err(Error::InvalidConfig("min_price must be finite".to_string()));
        }
        let t = &self.timeouts;
        if [t.action_ms, t.listing_ms, t.confirmation_ms, t.run_ms].contains(&0) {
            return Err(Error::InvalidConfig("timeouts must be non-zero".to_string()));
        }
        if !matches!(self.browser.kind.as_str(), "chromium" | "firefox" | "webkit") {
            return Err(Error::InvalidConfig(format!("unknown browser {}", self.browser.kind)));
        }
        Ok(())
    }

    /// The catalog named by `catalog_path`, or the built-in one
    pub fn catalog(&self) -> Result<RouteCatalog> {
        match &self.catalog_path {
            Some(path) => RouteCatalog::load(path),
            None => RouteCatalog::builtin(),
        }
    }
}
