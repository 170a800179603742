//! Playwright browser automation
//!
//! A session is one long-lived `node` process running a generated driver
//! script. Commands go to its stdin as JSON lines and each gets exactly one
//! JSON line back, matched by id.

use async_trait::async_trait;
use flightpath_common::FlowConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, info, warn};

use crate::browser::{Browser, Locator, SessionFactory, WaitState};
use crate::error::{E2eError, E2eResult};

/// Time allowed for node to start and the browser to launch
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Slack on top of a command's own timeout before the driver counts as hung
const RESPONSE_GRACE: Duration = Duration::from_secs(5);

/// Time the driver gets to exit once its stdin is closed, before it is killed
const EXIT_GRACE: Duration = Duration::from_secs(3);

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub node_binary: PathBuf,
    /// chromium, firefox or webkit
    pub browser: String,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Default timeout of every page action
    pub action_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self::from_flow(&FlowConfig::default())
    }
}

impl PlaywrightConfig {
    pub fn from_flow(config: &FlowConfig) -> Self {
        Self {
            node_binary: config.browser.node_binary.clone(),
            browser: config.browser.kind.clone(),
            headless: config.browser.headless,
            viewport_width: config.browser.viewport_width,
            viewport_height: config.browser.viewport_height,
            action_timeout: config.timeouts.action(),
        }
    }
}

/// Generate the driver script for `config`
pub fn build_script(config: &PlaywrightConfig) -> String {
    format!(
        r#"
const readline = require('readline');

function send(message) {{
  process.stdout.write(JSON.stringify(message) + '\n');
}}

let playwright;
try {{
  playwright = require(require.resolve('playwright', {{ paths: [process.cwd()] }}));
}} catch (error) {{
  send({{ id: 0, ok: false, error: 'playwright-missing' }});
  process.exit(3);
}}

function resolve(page, locator, scope) {{
  const root = scope || page;
  switch (locator.kind) {{
    case 'css':
      return root.locator(locator.selector);
    case 'role':
      return locator.name === undefined
        ? root.getByRole(locator.role)
        : root.getByRole(locator.role, {{ name: locator.name }});
    case 'label':
      return root.getByLabel(locator.text);
    case 'nth':
      return resolve(page, locator.base, scope).nth(locator.index);
    case 'within':
      return resolve(page, locator.child, resolve(page, locator.parent, scope));
    default:
      throw new Error('unknown locator kind ' + locator.kind);
  }}
}}

async function execute(context, page, command) {{
  switch (command.op) {{
    case 'goto':
      await page.goto(command.url);
      return null;
    case 'select_option':
      await resolve(page, command.locator).selectOption(command.value);
      return null;
    case 'click':
      await resolve(page, command.locator).click();
      return null;
    case 'fill':
      await resolve(page, command.locator).fill(command.text);
      return null;
    case 'check':
      await resolve(page, command.locator).check();
      return null;
    case 'wait_for':
      await resolve(page, command.locator).waitFor({{ state: command.state, timeout: command.timeout_ms }});
      return null;
    case 'count':
      return await resolve(page, command.locator).count();
    case 'text_content':
      return await resolve(page, command.locator).textContent();
    case 'start_tracing':
      await context.tracing.start({{ screenshots: true, snapshots: true, sources: true }});
      return null;
    case 'stop_tracing':
      await context.tracing.stop(command.path ? {{ path: command.path }} : {{}});
      return null;
    case 'screenshot':
      await page.screenshot({{ path: command.path, fullPage: true }});
      return null;
    case 'close':
      await context.close();
      return null;
    default:
      throw new Error('unknown op ' + command.op);
  }}
}}

(async () => {{
  const browser = await playwright.{browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({action_timeout_ms});
  send({{ id: 0, ok: true }});

  const lines = readline.createInterface({{ input: process.stdin }});
  for await (const line of lines) {{
    if (!line.trim()) continue;
    const command = JSON.parse(line);
    try {{
      const value = await execute(context, page, command);
      send({{ id: command.id, ok: true, value: value === undefined ? null : value }});
    }} catch (error) {{
      const timeout = error instanceof playwright.errors.TimeoutError;
      send({{ id: command.id, ok: false, error: error.message, timeout }});
    }}
    if (command.op === 'close') break;
  }}
  await browser.close();
}})().catch((error) => {{
  console.error(error && error.stack ? error.stack : String(error));
  process.exit(1);
}});
"#,
        browser = config.browser,
        headless = config.headless,
        width = config.viewport_width,
        height = config.viewport_height,
        action_timeout_ms = config.action_timeout.as_millis(),
    )
}

/// One driver command
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Goto { url: String },
    SelectOption { locator: Locator, value: String },
    Click { locator: Locator },
    Fill { locator: Locator, text: String },
    Check { locator: Locator },
    WaitFor { locator: Locator, state: WaitState, timeout_ms: u64 },
    Count { locator: Locator },
    TextContent { locator: Locator },
    StartTracing,
    StopTracing { path: Option<PathBuf> },
    Screenshot { path: PathBuf },
    Close,
}

impl Command {
    /// Short description used in timeout errors
    fn describe(&self) -> String {
        match self {
            Command::Goto { url } => format!("goto {}", url),
            Command::SelectOption { locator, value } => format!("select {:?} in {}", value, locator),
            Command::Click { locator } => format!("click {}", locator),
            Command::Fill { locator, .. } => format!("fill {}", locator),
            Command::Check { locator } => format!("check {}", locator),
            Command::WaitFor { locator, .. } => locator.to_string(),
            Command::Count { locator } => format!("count {}", locator),
            Command::TextContent { locator } => format!("text of {}", locator),
            Command::StartTracing => "start tracing".to_string(),
            Command::StopTracing { .. } => "stop tracing".to_string(),
            Command::Screenshot { path } => format!("screenshot {}", path.display()),
            Command::Close => "close".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a Command,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub id: u64,
    pub ok: bool,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timeout: bool,
}

/// A live browser driven through the node driver
pub struct PlaywrightSession {
    child: Child,
    /// Dropped on close so the driver sees EOF
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    action_timeout: Duration,
    closed: bool,
    _workdir: TempDir,
}

impl PlaywrightSession {
    /// Start node with the driver script and wait for the browser to be ready
    pub async fn launch(config: &PlaywrightConfig) -> E2eResult<Self> {
        let workdir = tempfile::tempdir()?;
        let script_path = workdir.path().join("driver.js");
        tokio::fs::write(&script_path, build_script(config)).await?;

        debug!("Launching Playwright driver: {}", script_path.display());

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => E2eError::PlaywrightNotFound,
                _ => E2eError::Io(e),
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Playwright("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("driver stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("[playwright] {}", line);
                }
            });
        }

        let mut session = Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
            action_timeout: config.action_timeout,
            closed: false,
            _workdir: workdir,
        };

        let ready = tokio::time::timeout(LAUNCH_TIMEOUT, session.read_response(0))
            .await
            .map_err(|_| E2eError::StageTimeout {
                what: format!("{} launch", config.browser),
                timeout_ms: LAUNCH_TIMEOUT.as_millis() as u64,
            })??;

        match ready.error.as_deref() {
            None if ready.ok => {
                info!("Playwright {} session ready", config.browser);
                Ok(session)
            }
            Some("playwright-missing") => Err(E2eError::PlaywrightNotFound),
            other => Err(E2eError::Playwright(other.unwrap_or("driver failed to start").to_string())),
        }
    }

    async fn read_response(&mut self, id: u64) -> E2eResult<Response> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Playwright("driver exited unexpectedly".to_string()))?;

            match serde_json::from_str::<Response>(&line) {
                Ok(response) if response.id == id => return Ok(response),
                Ok(response) => debug!("Dropping stale driver response {}", response.id),
                Err(_) => debug!("[playwright] {}", line),
            }
        }
    }

    async fn send(&mut self, command: Command, budget: Duration) -> E2eResult<serde_json::Value> {
        let stdin = match self.stdin.as_mut() {
            Some(stdin) if !self.closed => stdin,
            _ => return Err(E2eError::Playwright("session already closed".to_string())),
        };
        self.next_id += 1;
        let id = self.next_id;

        let mut line = serde_json::to_string(&Request { id, command: &command })?;
        line.push('\n');
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;

        let timed_out = || E2eError::StageTimeout {
            what: command.describe(),
            timeout_ms: budget.as_millis() as u64,
        };

        let response = tokio::time::timeout(budget + RESPONSE_GRACE, self.read_response(id))
            .await
            .map_err(|_| timed_out())??;

        if response.ok {
            Ok(response.value)
        } else if response.timeout {
            Err(timed_out())
        } else {
            Err(E2eError::Playwright(
                response.error.unwrap_or_else(|| format!("{} failed", command.describe())),
            ))
        }
    }

    async fn act(&mut self, command: Command) -> E2eResult<serde_json::Value> {
        let budget = self.action_timeout;
        self.send(command, budget).await
    }
}

#[async_trait]
impl Browser for PlaywrightSession {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.act(Command::Goto { url: url.to_string() }).await?;
        Ok(())
    }

    async fn select_option(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.act(Command::SelectOption {
            locator: locator.clone(),
            value: value.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> E2eResult<()> {
        self.act(Command::Click { locator: locator.clone() }).await?;
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, text: &str) -> E2eResult<()> {
        self.act(Command::Fill {
            locator: locator.clone(),
            text: text.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn check(&mut self, locator: &Locator) -> E2eResult<()> {
        self.act(Command::Check { locator: locator.clone() }).await?;
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        let command = Command::WaitFor {
            locator: locator.clone(),
            state,
            timeout_ms: timeout.as_millis() as u64,
        };
        self.send(command, timeout).await?;
        Ok(())
    }

    async fn count(&mut self, locator: &Locator) -> E2eResult<usize> {
        let value = self.act(Command::Count { locator: locator.clone() }).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| E2eError::Playwright(format!("count returned {}", value)))
    }

    async fn text_content(&mut self, locator: &Locator) -> E2eResult<Option<String>> {
        let value = self.act(Command::TextContent { locator: locator.clone() }).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn start_tracing(&mut self) -> E2eResult<()> {
        self.act(Command::StartTracing).await?;
        Ok(())
    }

    async fn stop_tracing(&mut self, path: Option<&Path>) -> E2eResult<()> {
        if let Some(parent) = path.and_then(Path::parent) {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.act(Command::StopTracing {
            path: path.map(Path::to_path_buf),
        })
        .await?;
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.act(Command::Screenshot { path: path.to_path_buf() }).await?;
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.act(Command::Close).await;
        self.closed = true;
        drop(self.stdin.take());

        if result.is_err() {
            if let Err(e) = self.child.start_kill() {
                debug!("Could not signal driver: {}", e);
            }
        }

        match tokio::time::timeout(EXIT_GRACE, self.child.wait()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("Driver did not exit cleanly: {}", e),
            Err(_) => {
                warn!("Driver still running {:?} after close, killing it", EXIT_GRACE);
                if let Err(e) = self.child.kill().await {
                    warn!("Could not kill driver: {}", e);
                }
            }
        }
        result.map(|_| ())
    }
}

/// Launches one Playwright session per run
#[derive(Debug, Clone)]
pub struct PlaywrightLauncher {
    config: PlaywrightConfig,
}

impl PlaywrightLauncher {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for PlaywrightLauncher {
    async fn open(&self) -> E2eResult<Box<dyn Browser>> {
        let session = PlaywrightSession::launch(&self.config).await?;
        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::selectors;

    #[test]
    fn test_script_uses_config() {
        let config = PlaywrightConfig {
            browser: "firefox".to_string(),
            headless: false,
            viewport_width: 800,
            viewport_height: 600,
            action_timeout: Duration::from_millis(2500),
            ..Default::default()
        };
        let script = build_script(&config);
        assert!(script.contains("playwright.firefox.launch({ headless: false })"));
        assert!(script.contains("viewport: { width: 800, height: 600 }"));
        assert!(script.contains("page.setDefaultTimeout(2500)"));
    }

    #[test]
    fn test_script_handles_every_command() {
        let script = build_script(&PlaywrightConfig::default());
        for op in [
            "goto",
            "select_option",
            "click",
            "fill",
            "check",
            "wait_for",
            "count",
            "text_content",
            "start_tracing",
            "stop_tracing",
            "screenshot",
            "close",
        ] {
            assert!(script.contains(&format!("case '{}'", op)), "missing op {}", op);
        }
    }

    #[test]
    fn test_request_wire_format() {
        let command = Command::Click {
            locator: selectors::flight_button(2),
        };
        let json = serde_json::to_value(Request { id: 7, command: &command }).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["op"], "click");
        assert_eq!(json["locator"]["kind"], "within");
        assert_eq!(json["locator"]["parent"]["index"], 2);

        let json = serde_json::to_value(Request {
            id: 1,
            command: &Command::StartTracing,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "id": 1, "op": "start_tracing" }));
    }

    #[test]
    fn test_response_defaults() {
        let response: Response = serde_json::from_str(r#"{"id":3,"ok":true}"#).unwrap();
        assert!(response.ok);
        assert!(response.value.is_null());
        assert!(!response.timeout);

        let response: Response =
            serde_json::from_str(r#"{"id":4,"ok":false,"error":"Timeout 5000ms exceeded","timeout":true}"#).unwrap();
        assert!(response.timeout);
        assert_eq!(response.error.as_deref(), Some("Timeout 5000ms exceeded"));
    }

    #[tokio::test]
    async fn test_missing_node_binary() {
        let config = PlaywrightConfig {
            node_binary: PathBuf::from("/nonexistent/flightpath-node"),
            ..Default::default()
        };
        let err = PlaywrightSession::launch(&config).await.err().unwrap();
        assert!(matches!(err, E2eError::PlaywrightNotFound));
    }

    /// Stand-in driver that reports ready and then ignores every command
    #[cfg(unix)]
    fn unresponsive_driver(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("hung-node");
        std::fs::write(&path, "#!/bin/sh\necho '{\"id\":0,\"ok\":true}'\nexec sleep 600\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_close_returns_when_driver_hangs() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlaywrightConfig {
            node_binary: unresponsive_driver(dir.path()),
            action_timeout: Duration::from_millis(100),
            ..Default::default()
        };
        let mut session = PlaywrightSession::launch(&config).await.unwrap();

        let closed = tokio::time::timeout(Duration::from_secs(20), session.close())
            .await
            .expect("close hung on an unresponsive driver");
        assert!(matches!(closed, Err(E2eError::StageTimeout { .. })));
        assert!(session.child.try_wait().unwrap().is_some());

        // A second close is a no-op and later commands are refused
        session.close().await.unwrap();
        assert!(session.goto("https://blazedemo.com").await.is_err());
    }
}
