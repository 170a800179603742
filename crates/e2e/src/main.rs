//! FlightPath CLI - Main Entry Point
//!
//! Runs purchase journey scenarios against the real site (Playwright) or the
//! simulated one, and writes `test-results.json`.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};

use flightpath_common::FlowConfig;
use flightpath_e2e::{
    PlaywrightConfig, PlaywrightLauncher, Scenario, SessionFactory, SimConfig, SimulatedSiteFactory,
    SuiteRunner,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    /// Real browser through Playwright
    Playwright,
    /// In-process simulated site
    Sim,
}

/// FlightPath - purchase journey runner
#[derive(Parser, Debug)]
#[command(name = "flightpath")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "flightpath.toml", env = "FLIGHTPATH_CONFIG")]
    config: PathBuf,

    /// What to drive
    #[arg(long, value_enum, default_value = "playwright")]
    target: Target,

    /// Override the site entry point
    #[arg(long, env = "FLIGHTPATH_BASE_URL")]
    base_url: Option<String>,

    /// Seed for reproducible runs
    #[arg(long, env = "FLIGHTPATH_SEED")]
    seed: Option<u64>,

    /// Directory of YAML scenarios (built-in suite when omitted)
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// Only run scenarios whose title contains this text
    #[arg(long)]
    name: Option<String>,

    /// Only run scenarios with this tag
    #[arg(long)]
    tag: Option<String>,

    /// chromium, firefox or webkit
    #[arg(long)]
    browser: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Results directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run a single journey from this city
    #[arg(long)]
    origin: Option<String>,

    /// Run a single journey to this city
    #[arg(long)]
    destination: Option<String>,

    /// Run a single journey booking this (1-based) flight
    #[arg(long)]
    flight: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn is_ad_hoc(&self) -> bool {
        self.origin.is_some() || self.destination.is_some() || self.flight.is_some()
    }

    /// File configuration with command-line overrides applied
    fn flow_config(&self) -> anyhow::Result<FlowConfig> {
        let mut config = FlowConfig::load(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(browser) = &self.browser {
            config.browser.kind = browser.clone();
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(output) = &self.output {
            config.artifacts.results_dir = output.clone();
        }

        config.check()?;
        Ok(config)
    }

    fn scenarios(&self) -> anyhow::Result<Vec<Scenario>> {
        if self.is_ad_hoc() {
            let mut scenario = Scenario::new("Ad-hoc journey");
            scenario.origin = self.origin.clone();
            scenario.destination = self.destination.clone();
            scenario.flight_index = self.flight;
            return Ok(vec![scenario]);
        }

        let mut scenarios = match &self.scenarios {
            Some(dir) => Scenario::load_all(dir)?,
            None => Scenario::builtin_suite(),
        };
        if let Some(name) = &self.name {
            scenarios.retain(|s| s.title.contains(name.as_str()));
        }
        if let Some(tag) = &self.tag {
            scenarios = Scenario::filter_by_tag(&scenarios, tag).into_iter().cloned().collect();
        }
        Ok(scenarios)
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = cli.flow_config()?;
    let scenarios = cli.scenarios()?;
    if scenarios.is_empty() {
        anyhow::bail!("no scenarios selected");
    }

    let factory: Box<dyn SessionFactory> = match cli.target {
        Target::Playwright => Box::new(PlaywrightLauncher::new(PlaywrightConfig::from_flow(&config))),
        Target::Sim => Box::new(SimulatedSiteFactory::new(SimConfig {
            base_url: config.base_url.clone(),
            action_timeout: config.timeouts.action(),
            ..SimConfig::default()
        })),
    };

    info!("FlightPath {} ({:?} target)", flightpath_common::VERSION, cli.target);

    let mut runner = SuiteRunner::new(config, factory)?;
    let suite = runner.run_all(&scenarios).await?;
    let path = runner.write_results(&suite)?;

    println!(
        "{} passed, {} failed, {} total ({} ms) - {}",
        suite.passed,
        suite.failed,
        suite.total,
        suite.duration_ms,
        path.display()
    );
    Ok(suite.all_passed())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(2);
        }
    }
}
