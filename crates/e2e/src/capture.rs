//! Failure artifact capture
//!
//! Tracing starts before every run. When a run's outcome does not match what
//! was expected, a full-page screenshot and the trace are written under names
//! derived from the run title; otherwise the trace is discarded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, warn};

use crate::browser::Browser;
use crate::error::E2eResult;
use flightpath_common::config::ArtifactConfig;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static pattern"));

/// File stem for a run title: every whitespace run becomes one `_`
pub fn artifact_stem(title: &str) -> String {
    WHITESPACE.replace_all(title, "_").into_owned()
}

/// Paths written for a failed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    pub screenshot: Option<PathBuf>,
    pub trace: Option<PathBuf>,
}

impl Artifacts {
    pub fn is_empty(&self) -> bool {
        self.screenshot.is_none() && self.trace.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactCapture {
    screenshot_dir: PathBuf,
    trace_dir: PathBuf,
}

impl ArtifactCapture {
    pub fn new(screenshot_dir: impl Into<PathBuf>, trace_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshot_dir: screenshot_dir.into(),
            trace_dir: trace_dir.into(),
        }
    }

    pub fn from_config(config: &ArtifactConfig) -> Self {
        Self::new(&config.screenshot_dir, &config.trace_dir)
    }

    pub fn screenshot_path(&self, title: &str) -> PathBuf {
        self.screenshot_dir.join(format!("{}.png", artifact_stem(title)))
    }

    pub fn trace_path(&self, title: &str) -> PathBuf {
        self.trace_dir.join(format!("{}.zip", artifact_stem(title)))
    }

    /// Start recording a trace (screenshots, DOM snapshots, sources)
    pub async fn begin(&self, session: &mut dyn Browser) -> E2eResult<()> {
        session.start_tracing().await
    }

    /// Persist or discard what `begin` started.
    ///
    /// Best effort: a failure here is logged and never replaces the run's own
    /// outcome.
    pub async fn finish(&self, session: &mut dyn Browser, title: &str, failed: bool) -> Artifacts {
        if !failed {
            if let Err(e) = session.stop_tracing(None).await {
                warn!("Could not discard trace for {}: {}", title, e);
            }
            return Artifacts::default();
        }

        error!("TEST FAILED → {}", title);
        let mut artifacts = Artifacts::default();

        let screenshot = self.screenshot_path(title);
        match session.screenshot(&screenshot).await {
            Ok(()) => artifacts.screenshot = Some(screenshot),
            Err(e) => warn!("Screenshot for {} failed: {}", title, e),
        }

        let trace = self.trace_path(title);
        match session.stop_tracing(Some(trace.as_path())).await {
            Ok(()) => artifacts.trace = Some(trace),
            Err(e) => warn!("Trace for {} could not be saved: {}", title, e),
        }

        artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimConfig, SimulatedSite};

    #[test]
    fn test_artifact_stem() {
        assert_eq!(artifact_stem("Valid Flight Purchase"), "Valid_Flight_Purchase");
        assert_eq!(artifact_stem("Same  city\tdeparture"), "Same_city_departure");
        assert_eq!(artifact_stem("plain"), "plain");
    }

    #[test]
    fn test_paths() {
        let capture = ArtifactCapture::new("shots", "traces");
        assert_eq!(
            capture.screenshot_path("Price Check"),
            PathBuf::from("shots/Price_Check.png")
        );
        assert_eq!(capture.trace_path("Price Check"), PathBuf::from("traces/Price_Check.zip"));
    }

    #[tokio::test]
    async fn test_failed_run_writes_both() {
        let dir = tempfile::tempdir().unwrap();
        let capture = ArtifactCapture::new(dir.path().join("screenshots"), dir.path().join("traces"));
        let mut site = SimulatedSite::new(SimConfig::default());

        capture.begin(&mut site).await.unwrap();
        let artifacts = capture.finish(&mut site, "Broken run", true).await;

        let screenshot = artifacts.screenshot.unwrap();
        let trace = artifacts.trace.unwrap();
        assert!(screenshot.ends_with("screenshots/Broken_run.png"));
        assert!(trace.ends_with("traces/Broken_run.zip"));
        assert!(screenshot.exists());
        assert!(trace.exists());
    }

    #[tokio::test]
    async fn test_passing_run_discards_trace() {
        let dir = tempfile::tempdir().unwrap();
        let capture = ArtifactCapture::new(dir.path().join("screenshots"), dir.path().join("traces"));
        let mut site = SimulatedSite::new(SimConfig::default());

        capture.begin(&mut site).await.unwrap();
        let artifacts = capture.finish(&mut site, "Good run", false).await;

        assert!(artifacts.is_empty());
        assert_eq!(site.log().traces_discarded, 1);
        assert!(!dir.path().join("traces").exists());
    }

    #[tokio::test]
    async fn test_capture_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let capture = ArtifactCapture::new(dir.path().join("screenshots"), dir.path().join("traces"));
        let mut site = SimulatedSite::new(SimConfig::default());

        // Tracing never started, so only the screenshot lands
        let artifacts = capture.finish(&mut site, "No trace", true).await;
        assert!(artifacts.screenshot.is_some());
        assert!(artifacts.trace.is_none());
    }
}
