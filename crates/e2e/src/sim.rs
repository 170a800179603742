//! Simulated booking site
//!
//! An in-process model of the target's four pages (search, listing, purchase
//! form, confirmation) behind the [`Browser`] trait. It answers the same
//! locators the stages use, enforces the same "element must exist" rules a
//! real page would, and writes placeholder artifact files, so whole journeys
//! and suites can run without node or a network.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::browser::{Browser, Locator, SessionFactory, WaitState};
use crate::error::{E2eError, E2eResult};
use crate::stages::selectors;

/// Heading shown once a booking is placed
pub const CONFIRMATION_HEADING: &str = "Thank you for your purchase";

/// Card types offered by the purchase form
const CARD_TYPES: [&str; 3] = ["visa", "amex", "dinersclub"];

/// Behaviour of the simulated site
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub base_url: String,

    /// Options of the departure selector
    pub departures: Vec<String>,

    /// Options of the destination selector
    pub destinations: Vec<String>,

    /// One listing row per fare; empty means no flights
    pub fares: Vec<f64>,

    /// Status shown on the confirmation page
    pub status_label: String,

    /// Overrides the confirmation amount cell (defaults to the booked fare)
    pub amount_text: Option<String>,

    /// Delay applied to every browser call
    pub latency: Duration,

    /// Reported in timeout errors for element lookups
    pub action_timeout: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            base_url: "https://blazedemo.com".to_string(),
            departures: owned(&[
                "Paris",
                "Philadelphia",
                "Boston",
                "Portland",
                "San Diego",
                "Mexico City",
                "São Paolo",
            ]),
            destinations: owned(&[
                "Buenos Aires",
                "Rome",
                "London",
                "Berlin",
                "New York",
                "Dublin",
                "Cairo",
            ]),
            fares: vec![472.56, 432.98, 200.98, 765.32, 233.98],
            status_label: "PendingCapture".to_string(),
            amount_text: None,
            latency: Duration::ZERO,
            action_timeout: Duration::from_secs(10),
        }
    }
}

/// Everything the simulated sessions did, shared with whoever created them
#[derive(Debug, Clone, Default)]
pub struct SimLog {
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub navigations: usize,
    pub actions: Vec<String>,
    /// Purchase forms as they were submitted, keyed by input selector
    pub submitted_forms: Vec<HashMap<String, String>>,
    pub traces_started: usize,
    pub traces_saved: Vec<PathBuf>,
    pub traces_discarded: usize,
    pub screenshots: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
enum SimPage {
    Blank,
    Home {
        from: Option<String>,
        to: Option<String>,
    },
    Reserve {
        fares: Vec<f64>,
    },
    Purchase {
        fare: f64,
        fields: HashMap<String, String>,
        card_type: String,
        remember: bool,
    },
    Confirmation {
        table: Vec<Vec<String>>,
    },
    Closed,
}

/// One simulated browser session
pub struct SimulatedSite {
    config: SimConfig,
    page: SimPage,
    tracing: bool,
    bookings: u64,
    log: Arc<Mutex<SimLog>>,
}

impl SimulatedSite {
    pub fn new(config: SimConfig) -> Self {
        Self::with_log(config, Arc::new(Mutex::new(SimLog::default())))
    }

    /// Session that records into an existing log
    pub fn with_log(config: SimConfig, log: Arc<Mutex<SimLog>>) -> Self {
        log.lock().sessions_opened += 1;
        Self {
            config,
            page: SimPage::Blank,
            tracing: false,
            bookings: 0,
            log,
        }
    }

    pub fn log(&self) -> SimLog {
        self.log.lock().clone()
    }

    async fn pause(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }

    fn record(&self, action: String) {
        debug!("[sim] {}", action);
        self.log.lock().actions.push(action);
    }

    fn ensure_open(&self) -> E2eResult<()> {
        if matches!(self.page, SimPage::Closed) {
            return Err(E2eError::Simulation(
                "Target page, context or browser has been closed".to_string(),
            ));
        }
        Ok(())
    }

    fn not_found(&self, locator: &Locator) -> E2eError {
        E2eError::StageTimeout {
            what: locator.to_string(),
            timeout_ms: self.config.action_timeout.as_millis() as u64,
        }
    }

    fn exists(&self, locator: &Locator) -> bool {
        match &self.page {
            SimPage::Home { .. } => [selectors::from_port(), selectors::to_port(), selectors::find_flights()]
                .contains(locator),
            SimPage::Reserve { fares } => {
                (*locator == selectors::flight_rows() && !fares.is_empty())
                    || listing_row(locator).or_else(|| button_row(locator)).map_or(false, |row| row < fares.len())
            }
            SimPage::Purchase { .. } => {
                form_input(locator).is_some()
                    || *locator == Locator::css(selectors::CARD_TYPE)
                    || *locator == selectors::remember_me()
                    || *locator == selectors::purchase_flight()
            }
            SimPage::Confirmation { table } => confirmation_text(table, locator).is_some(),
            SimPage::Blank | SimPage::Closed => false,
        }
    }

    fn confirmation_table(&mut self, fare: f64, fields: &HashMap<String, String>) -> Vec<Vec<String>> {
        self.bookings += 1;
        let field = |selector: &str| fields.get(selector).cloned().unwrap_or_default();
        let card = field(selectors::CARD_NUMBER);
        let last_four = &card[card.len().saturating_sub(4)..];
        let amount = self
            .config
            .amount_text
            .clone()
            .unwrap_or_else(|| format!("{:.2} USD", fare));

        // Row 0 is the header row, which has no data cells
        vec![
            vec![],
            vec!["Id".to_string(), format!("{}", 1_700_000_000_000u64 + self.bookings)],
            vec!["Status".to_string(), self.config.status_label.clone()],
            vec!["Amount".to_string(), amount],
            vec!["Card Number".to_string(), format!("xxxxxxxxxxx{}", last_four)],
            vec![
                "Expiration".to_string(),
                format!("{} /{}", field(selectors::CARD_MONTH), field(selectors::CARD_YEAR)),
            ],
            vec!["Auth Code".to_string(), "888888".to_string()],
            vec!["Date".to_string(), chrono::Utc::now().to_rfc2822()],
        ]
    }
}

/// 0-based listing row addressed by `rows >> nth=i`
fn listing_row(locator: &Locator) -> Option<usize> {
    match locator {
        Locator::Nth { base, index } if **base == selectors::flight_rows() => Some(*index),
        _ => None,
    }
}

/// 0-based listing row whose button is addressed
fn button_row(locator: &Locator) -> Option<usize> {
    match locator {
        Locator::Within { parent, child } if **child == Locator::any_role("button") => listing_row(parent),
        _ => None,
    }
}

/// Purchase form input addressed by `locator`
fn form_input(locator: &Locator) -> Option<&'static str> {
    match locator {
        Locator::Css { selector } => selectors::FORM_INPUTS.iter().copied().find(|s| *s == selector.as_str()),
        _ => None,
    }
}

/// (row, column) of `table tr >> nth=r >> td >> nth=c`
fn table_position(locator: &Locator) -> Option<(usize, usize)> {
    let Locator::Nth { base, index: column } = locator else {
        return None;
    };
    let Locator::Within { parent, child } = base.as_ref() else {
        return None;
    };
    if **child != Locator::css("td") {
        return None;
    }
    let Locator::Nth { base: rows, index: row } = parent.as_ref() else {
        return None;
    };
    if **rows != Locator::css("table tr") {
        return None;
    }
    Some((*row, *column))
}

fn confirmation_text(table: &[Vec<String>], locator: &Locator) -> Option<String> {
    match locator {
        Locator::Role { role, name: Some(name) } if role == "heading" && name == CONFIRMATION_HEADING => {
            Some(CONFIRMATION_HEADING.to_string())
        }
        Locator::Role { role, name: Some(name) } if role == "cell" => {
            table.iter().flatten().find(|cell| *cell == name).cloned()
        }
        _ => {
            let (row, column) = table_position(locator)?;
            table.get(row)?.get(column).cloned()
        }
    }
}

async fn write_placeholder(path: &Path, contents: &[u8]) -> E2eResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}

#[async_trait]
impl Browser for SimulatedSite {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.pause().await;
        self.ensure_open()?;
        self.record(format!("goto {}", url));

        if url.trim_end_matches('/') != self.config.base_url.trim_end_matches('/') {
            return Err(E2eError::Simulation(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)));
        }
        self.log.lock().navigations += 1;
        self.page = SimPage::Home { from: None, to: None };
        Ok(())
    }

    async fn select_option(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.pause().await;
        self.ensure_open()?;
        self.record(format!("select {} = {}", locator, value));

        if !self.exists(locator) {
            return Err(self.not_found(locator));
        }
        let missing_option = || E2eError::StageTimeout {
            what: format!("option {:?} of {}", value, locator),
            timeout_ms: self.config.action_timeout.as_millis() as u64,
        };

        match &mut self.page {
            SimPage::Home { from, to } => {
                if *locator == selectors::from_port() {
                    if !self.config.departures.iter().any(|d| d == value) {
                        return Err(missing_option());
                    }
                    *from = Some(value.to_string());
                } else if *locator == selectors::to_port() {
                    if !self.config.destinations.iter().any(|d| d == value) {
                        return Err(missing_option());
                    }
                    *to = Some(value.to_string());
                }
            }
            SimPage::Purchase { card_type, .. } => {
                if !CARD_TYPES.contains(&value) {
                    return Err(missing_option());
                }
                *card_type = value.to_string();
            }
            _ => {}
        }
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> E2eResult<()> {
        self.pause().await;
        self.ensure_open()?;
        self.record(format!("click {}", locator));

        if !self.exists(locator) {
            return Err(self.not_found(locator));
        }

        let next = match &self.page {
            SimPage::Home { from, to } if *locator == selectors::find_flights() => {
                if from.is_none() || to.is_none() {
                    return Err(E2eError::Simulation("search submitted without both cities".to_string()));
                }
                Some(SimPage::Reserve {
                    fares: self.config.fares.clone(),
                })
            }
            SimPage::Reserve { fares } => button_row(locator).map(|row| SimPage::Purchase {
                fare: fares[row],
                fields: HashMap::new(),
                card_type: "visa".to_string(),
                remember: false,
            }),
            SimPage::Purchase { fare, fields, .. } if *locator == selectors::purchase_flight() => {
                if let Some(missing) = selectors::FORM_INPUTS
                    .iter()
                    .find(|s| fields.get(**s).map_or(true, |v| v.is_empty()))
                {
                    return Err(E2eError::Simulation(format!("purchase form incomplete: {}", missing)));
                }
                let (fare, fields) = (*fare, fields.clone());
                self.log.lock().submitted_forms.push(fields.clone());
                Some(SimPage::Confirmation {
                    table: self.confirmation_table(fare, &fields),
                })
            }
            _ => None,
        };

        if let Some(page) = next {
            self.page = page;
        }
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, text: &str) -> E2eResult<()> {
        self.pause().await;
        self.ensure_open()?;
        self.record(format!("fill {}", locator));

        if let (SimPage::Purchase { fields, .. }, Some(input)) = (&mut self.page, form_input(locator)) {
            fields.insert(input.to_string(), text.to_string());
            return Ok(());
        }
        Err(self.not_found(locator))
    }

    async fn check(&mut self, locator: &Locator) -> E2eResult<()> {
        self.pause().await;
        self.ensure_open()?;
        self.record(format!("check {}", locator));

        if *locator == selectors::remember_me() {
            if let SimPage::Purchase { remember, .. } = &mut self.page {
                *remember = true;
                return Ok(());
            }
        }
        Err(self.not_found(locator))
    }

    async fn wait_for(&mut self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        self.pause().await;
        self.ensure_open()?;

        let present = self.exists(locator);
        let satisfied = match state {
            WaitState::Visible | WaitState::Attached => present,
            WaitState::Hidden | WaitState::Detached => !present,
        };
        if satisfied {
            Ok(())
        } else {
            Err(E2eError::StageTimeout {
                what: locator.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }

    async fn count(&mut self, locator: &Locator) -> E2eResult<usize> {
        self.pause().await;
        self.ensure_open()?;

        let count = match &self.page {
            SimPage::Reserve { fares } if *locator == selectors::flight_rows() => fares.len(),
            SimPage::Confirmation { table } if *locator == Locator::css("table tr") => table.len(),
            _ => usize::from(self.exists(locator)),
        };
        Ok(count)
    }

    async fn text_content(&mut self, locator: &Locator) -> E2eResult<Option<String>> {
        self.pause().await;
        self.ensure_open()?;

        if !self.exists(locator) {
            return Err(self.not_found(locator));
        }
        let text = match &self.page {
            SimPage::Confirmation { table } => confirmation_text(table, locator),
            SimPage::Reserve { fares } => listing_row(locator).map(|row| format!("Choose This Flight ${}", fares[row])),
            _ => None,
        };
        Ok(text)
    }

    async fn start_tracing(&mut self) -> E2eResult<()> {
        self.ensure_open()?;
        if self.tracing {
            return Err(E2eError::Simulation("Tracing has been already started".to_string()));
        }
        self.tracing = true;
        self.log.lock().traces_started += 1;
        Ok(())
    }

    async fn stop_tracing(&mut self, path: Option<&Path>) -> E2eResult<()> {
        self.ensure_open()?;
        if !self.tracing {
            return Err(E2eError::Simulation("Must start tracing before stopping".to_string()));
        }
        self.tracing = false;

        match path {
            Some(path) => {
                let actions = self.log.lock().actions.join("\n");
                write_placeholder(path, actions.as_bytes()).await?;
                self.log.lock().traces_saved.push(path.to_path_buf());
            }
            None => self.log.lock().traces_discarded += 1,
        }
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        self.ensure_open()?;
        write_placeholder(path, b"\x89PNG\r\n\x1a\nsimulated").await?;
        self.log.lock().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if !matches!(self.page, SimPage::Closed) {
            self.page = SimPage::Closed;
            self.log.lock().sessions_closed += 1;
        }
        Ok(())
    }
}

/// Opens simulated sessions that all record into one [`SimLog`]
#[derive(Clone)]
pub struct SimulatedSiteFactory {
    config: SimConfig,
    log: Arc<Mutex<SimLog>>,
}

impl SimulatedSiteFactory {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            log: Arc::new(Mutex::new(SimLog::default())),
        }
    }

    pub fn log(&self) -> SimLog {
        self.log.lock().clone()
    }
}

#[async_trait]
impl SessionFactory for SimulatedSiteFactory {
    async fn open(&self) -> E2eResult<Box<dyn Browser>> {
        Ok(Box::new(SimulatedSite::with_log(self.config.clone(), self.log.clone())))
    }

    fn is_remote(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_requires_home_page() {
        let mut site = SimulatedSite::new(SimConfig::default());
        let err = site.click(&selectors::find_flights()).await.unwrap_err();
        assert!(matches!(err, E2eError::StageTimeout { .. }));

        site.goto("https://blazedemo.com/").await.unwrap();
        site.select_option(&selectors::from_port(), "Boston").await.unwrap();
        site.select_option(&selectors::to_port(), "Berlin").await.unwrap();
        site.click(&selectors::find_flights()).await.unwrap();
        assert_eq!(site.count(&selectors::flight_rows()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_unknown_option_times_out() {
        let mut site = SimulatedSite::new(SimConfig::default());
        site.goto("https://blazedemo.com").await.unwrap();
        let err = site
            .select_option(&selectors::to_port(), "Tokyo")
            .await
            .unwrap_err();
        assert!(matches!(err, E2eError::StageTimeout { ref what, .. } if what.contains("Tokyo")));
    }

    #[tokio::test]
    async fn test_unreachable_url() {
        let mut site = SimulatedSite::new(SimConfig::default());
        let err = site.goto("https://example.invalid").await.unwrap_err();
        assert!(matches!(err, E2eError::Simulation(_)));
        assert_eq!(site.log().navigations, 0);
    }

    #[tokio::test]
    async fn test_tracing_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = SimulatedSite::new(SimConfig::default());
        assert!(site.stop_tracing(None).await.is_err());

        site.start_tracing().await.unwrap();
        assert!(site.start_tracing().await.is_err());
        let trace = dir.path().join("traces").join("t.zip");
        site.stop_tracing(Some(&trace)).await.unwrap();
        assert!(trace.exists());

        site.close().await.unwrap();
        assert!(site.goto("https://blazedemo.com").await.is_err());
        assert_eq!(site.log().sessions_closed, 1);
    }

    #[test]
    fn test_table_position_matches_stage_locator() {
        assert_eq!(table_position(&selectors::table_cell(3, 1)), Some((3, 1)));
        assert_eq!(table_position(&selectors::flight_rows()), None);
    }
}
