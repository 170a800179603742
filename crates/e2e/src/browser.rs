//! Browser capability consumed by the journey stages
//!
//! Stages never talk to Playwright directly. They receive a `&mut dyn Browser`
//! from the workflow and address elements with [`Locator`] values, which the
//! Playwright bridge and the simulated target both understand.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::E2eResult;

/// Element address, resolved relative to the page (or to a parent locator)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector
    Css { selector: String },

    /// ARIA role with an optional accessible name
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Form control by its label text
    Label { text: String },

    /// The `index`-th (0-based) match of `base`
    Nth { base: Box<Locator>, index: usize },

    /// `child` searched inside `parent`
    Within { parent: Box<Locator>, child: Box<Locator> },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css { selector: selector.into() }
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: Some(name.into()),
        }
    }

    pub fn any_role(role: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: None,
        }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Locator::Label { text: text.into() }
    }

    pub fn nth(self, index: usize) -> Self {
        Locator::Nth {
            base: Box::new(self),
            index,
        }
    }

    pub fn locate(self, child: Locator) -> Self {
        Locator::Within {
            parent: Box::new(self),
            child: Box::new(child),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { selector } => write!(f, "{}", selector),
            Locator::Role { role, name: Some(name) } => write!(f, "role={}[name=\"{}\"]", role, name),
            Locator::Role { role, name: None } => write!(f, "role={}", role),
            Locator::Label { text } => write!(f, "label=\"{}\"", text),
            Locator::Nth { base, index } => write!(f, "{} >> nth={}", base, index),
            Locator::Within { parent, child } => write!(f, "{} >> {}", parent, child),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

/// One isolated browser session (page plus its context)
///
/// Every method suspends until the target answers and is bounded by the
/// implementation's action timeout; `wait_for` takes its own bound.
#[async_trait]
pub trait Browser: Send {
    async fn goto(&mut self, url: &str) -> E2eResult<()>;

    async fn select_option(&mut self, locator: &Locator, value: &str) -> E2eResult<()>;

    async fn click(&mut self, locator: &Locator) -> E2eResult<()>;

    async fn fill(&mut self, locator: &Locator, text: &str) -> E2eResult<()>;

    async fn check(&mut self, locator: &Locator) -> E2eResult<()>;

    async fn wait_for(&mut self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()>;

    async fn count(&mut self, locator: &Locator) -> E2eResult<usize>;

    async fn text_content(&mut self, locator: &Locator) -> E2eResult<Option<String>>;

    /// Begin recording a trace with screenshots and DOM snapshots
    async fn start_tracing(&mut self) -> E2eResult<()>;

    /// Stop recording; the trace is written to `path` or discarded
    async fn stop_tracing(&mut self, path: Option<&Path>) -> E2eResult<()>;

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()>;

    async fn close(&mut self) -> E2eResult<()>;
}

/// Opens a fresh, isolated session per run
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> E2eResult<Box<dyn Browser>>;

    /// Whether the target lives on the network and is checked for reachability first
    fn is_remote(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_wire_format() {
        let locator = Locator::css("table tbody tr").nth(2).locate(Locator::any_role("button"));
        let json = serde_json::to_value(&locator).unwrap();
        assert_eq!(json["kind"], "within");
        assert_eq!(json["parent"]["kind"], "nth");
        assert_eq!(json["parent"]["index"], 2);
        assert_eq!(json["child"]["role"], "button");
        assert!(json["child"].get("name").is_none());

        let back: Locator = serde_json::from_value(json).unwrap();
        assert_eq!(back, locator);
    }

    #[test]
    fn test_locator_display() {
        let locator = Locator::role("button", "Find Flights");
        assert_eq!(locator.to_string(), "role=button[name=\"Find Flights\"]");
        let cell = Locator::css("table tr").nth(3).locate(Locator::css("td")).nth(1);
        assert_eq!(cell.to_string(), "table tr >> nth=3 >> td >> nth=1");
    }
}
