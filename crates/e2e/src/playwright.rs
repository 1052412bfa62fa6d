//! Playwright browser automation
//!
//! Each [`PlaywrightPage`] owns a Node process running a small bridge script.
//! The bridge launches the browser, opens one context with one page and then
//! answers newline-delimited JSON requests on stdin, one reply per line on
//! stdout. Page state survives between requests, so a scenario's actions and
//! assertions all see the same page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::{BoundingBox, Browser, Page};

/// Extra time allowed for a bridge reply beyond the Playwright-side timeout
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// Browser launch is slow on cold caches
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(60);

/// How long the bridge gets to close its browser after SIGTERM
const TERM_GRACE: Duration = Duration::from_millis(500);

const BRIDGE_SCRIPT: &str = r#"
const { createRequire } = require('module');
const readline = require('readline');

const requireFromCwd = createRequire(process.cwd() + '/');
const playwright = requireFromCwd('playwright');
const options = JSON.parse(process.argv[2]);

function send(reply) {
  process.stdout.write(JSON.stringify(reply) + '\n');
}

function resolve(page, loc) {
  switch (loc.kind) {
    case 'xpath':
      return page.locator('xpath=' + loc.value);
    case 'role':
      return loc.name == null ? page.getByRole(loc.role) : page.getByRole(loc.role, { name: loc.name });
    case 'text':
      return page.getByText(loc.value);
    default:
      return page.locator(loc.value);
  }
}

function classify(req, error) {
  const message = String((error && error.message) || error);
  const timedOut = error && error.name === 'TimeoutError';
  if (req.locator && (timedOut || message.includes('strict mode violation'))) {
    return 'locator';
  }
  return timedOut ? 'timeout' : 'error';
}

async function handle(page, req) {
  const el = req.locator ? resolve(page, req.locator) : null;
  switch (req.op) {
    case 'goto':
      await page.goto(req.url);
      return null;
    case 'fill':
      await el.fill(req.value);
      return null;
    case 'click':
      await el.click();
      return null;
    case 'press':
      await el.press(req.key);
      return null;
    case 'check':
      await el.check();
      return null;
    case 'wait_for_url':
      await page.waitForURL(req.pattern, { timeout: req.timeout_ms });
      return null;
    case 'url':
      return page.url();
    case 'inner_text':
      return await el.innerText();
    case 'attribute':
      return await el.getAttribute(req.name);
    case 'is_visible':
      try {
        await el.waitFor({ state: 'visible', timeout: req.timeout_ms });
        return true;
      } catch (error) {
        if (error && error.name === 'TimeoutError') return false;
        throw error;
      }
    case 'count':
      return await el.count();
    case 'bounding_box':
      if ((await el.count()) === 0) return null;
      return await el.boundingBox();
    case 'screenshot':
      await page.screenshot({ path: req.path, fullPage: true });
      return null;
    case 'close':
      return null;
    default:
      throw new Error('unknown op ' + req.op);
  }
}

(async () => {
  const browser = await playwright[options.browser].launch({ headless: options.headless });
  process.on('SIGTERM', () => browser.close().finally(() => process.exit(0)));
  const context = await browser.newContext({
    viewport: { width: options.viewport_width, height: options.viewport_height },
  });
  context.setDefaultTimeout(options.action_timeout_ms);
  const page = await context.newPage();
  send({ id: 0, ok: true, value: 'ready' });

  const lines = readline.createInterface({ input: process.stdin });
  for await (const line of lines) {
    if (!line.trim()) continue;
    const req = JSON.parse(line);
    try {
      const value = await handle(page, req);
      send({ id: req.id, ok: true, value: value === undefined ? null : value });
    } catch (error) {
      send({ id: req.id, ok: false, kind: classify(req, error), message: String((error && error.message) || error) });
    }
    if (req.op === 'close') break;
  }
  await browser.close();
})().catch((error) => {
  send({ id: 0, ok: false, kind: 'error', message: String((error && error.message) || error) });
  process.exit(1);
});
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" | "safari" => Ok(BrowserKind::Webkit),
            other => Err(E2eError::Config(format!("unknown browser '{}'", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Playwright auto-wait limit for element actions
    pub action_timeout_ms: u64,
    /// Node executable
    pub node_binary: PathBuf,
    /// Directory whose `node_modules` provides `playwright`
    pub working_dir: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout_ms: 5000,
            node_binary: PathBuf::from("node"),
            working_dir: PathBuf::from("."),
        }
    }
}

impl PlaywrightConfig {
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}

/// Launches one bridge process per page
pub struct PlaywrightBrowser {
    config: PlaywrightConfig,
}

impl PlaywrightBrowser {
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config.working_dir)?;
        Ok(Self { config })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed(working_dir: &Path) -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .current_dir(working_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }
}

#[async_trait]
impl Browser for PlaywrightBrowser {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>> {
        let page = PlaywrightPage::launch(&self.config).await?;
        Ok(Box::new(page))
    }
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// A page served by a Node bridge process
pub struct PlaywrightPage {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    action_timeout: Duration,
    closed: bool,
    // Holds the bridge script on disk for the child's lifetime
    _script_dir: TempDir,
}

impl PlaywrightPage {
    pub async fn launch(config: &PlaywrightConfig) -> E2eResult<Self> {
        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        let options = json!({
            "browser": config.browser.as_str(),
            "headless": config.headless,
            "viewport_width": config.viewport_width,
            "viewport_height": config.viewport_height,
            "action_timeout_ms": config.action_timeout_ms,
        });

        debug!("Launching Playwright bridge: {}", script_path.display());

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .arg(options.to_string())
            .current_dir(&config.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::Playwright(format!(
                    "Failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::BridgeClosed("stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::BridgeClosed("stdout not captured".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "playwright", "{}", line);
                }
            });
        }

        let mut page = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            action_timeout: config.action_timeout(),
            closed: false,
            _script_dir: script_dir,
        };

        let ready = tokio::time::timeout(LAUNCH_TIMEOUT, page.read_reply(0))
            .await
            .map_err(|_| E2eError::Timeout(format!("{} launch", config.browser)))??;
        if !ready.ok {
            return Err(E2eError::Playwright(ready.message.unwrap_or_default()));
        }

        info!("Playwright {} page ready", config.browser);
        Ok(page)
    }

    async fn read_reply(&mut self, id: u64) -> E2eResult<BridgeReply> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::BridgeClosed(format!("no reply to request {}", id)))?;

            match serde_json::from_str::<BridgeReply>(&line) {
                Ok(reply) if reply.id == id => return Ok(reply),
                Ok(reply) => warn!("Discarding stale bridge reply {}", reply.id),
                Err(_) => debug!(target: "playwright", "{}", line),
            }
        }
    }

    async fn request(
        &mut self,
        op: &str,
        locator: Option<&Locator>,
        mut payload: Value,
        wait: Option<Duration>,
    ) -> E2eResult<Value> {
        if self.closed {
            return Err(E2eError::BridgeClosed("page already closed".to_string()));
        }

        let id = self.next_id;
        self.next_id += 1;

        payload["id"] = json!(id);
        payload["op"] = json!(op);
        if let Some(locator) = locator {
            payload["locator"] = locator.to_bridge_json();
        }

        let mut line = payload.to_string();
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let limit = wait.unwrap_or(self.action_timeout) + REPLY_GRACE;
        let reply = tokio::time::timeout(limit, self.read_reply(id))
            .await
            .map_err(|_| E2eError::Timeout(format!("bridge reply to {}", op)))??;

        if reply.ok {
            return Ok(reply.value);
        }

        let message = reply.message.unwrap_or_default();
        Err(match (reply.kind.as_deref(), locator) {
            (Some("locator"), Some(locator)) => E2eError::Locator {
                locator: locator.to_string(),
                message,
            },
            (Some("timeout"), _) => E2eError::Timeout(message),
            _ => E2eError::Playwright(message),
        })
    }

    fn terminate(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                    let deadline = Instant::now() + TERM_GRACE;
                    while Instant::now() < deadline {
                        if let Ok(Some(_)) = self.child.try_wait() {
                            return;
                        }
                        std::thread::sleep(Duration::from_millis(20));
                    }
                }
            }
        }

        // Force kill if still running
        let _ = self.child.start_kill();
    }
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.request("goto", None, json!({ "url": url }), None).await?;
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.request("fill", Some(locator), json!({ "value": value }), None)
            .await?;
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> E2eResult<()> {
        self.request("click", Some(locator), json!({}), None).await?;
        Ok(())
    }

    async fn press(&mut self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.request("press", Some(locator), json!({ "key": key }), None)
            .await?;
        Ok(())
    }

    async fn check(&mut self, locator: &Locator) -> E2eResult<()> {
        self.request("check", Some(locator), json!({}), None).await?;
        Ok(())
    }

    async fn wait_for_url(&mut self, pattern: &str, timeout: Duration) -> E2eResult<()> {
        let payload = json!({ "pattern": pattern, "timeout_ms": timeout.as_millis() as u64 });
        self.request("wait_for_url", None, payload, Some(timeout))
            .await?;
        Ok(())
    }

    async fn url(&mut self) -> E2eResult<String> {
        let value = self.request("url", None, json!({}), None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn inner_text(&mut self, locator: &Locator) -> E2eResult<String> {
        let value = self
            .request("inner_text", Some(locator), json!({}), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&mut self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let value = self
            .request("attribute", Some(locator), json!({ "name": name }), None)
            .await?;
        Ok(value.as_str().map(String::from))
    }

    async fn is_visible(&mut self, locator: &Locator, timeout: Duration) -> E2eResult<bool> {
        let payload = json!({ "timeout_ms": timeout.as_millis() as u64 });
        let value = self
            .request("is_visible", Some(locator), payload, Some(timeout))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn count(&mut self, locator: &Locator) -> E2eResult<usize> {
        let value = self.request("count", Some(locator), json!({}), None).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn bounding_box(&mut self, locator: &Locator) -> E2eResult<Option<BoundingBox>> {
        let value = self
            .request("bounding_box", Some(locator), json!({}), None)
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        // The bridge runs in `working_dir`, not ours
        let path = if path.is_relative() {
            std::env::current_dir()?.join(path)
        } else {
            path.to_path_buf()
        };
        let payload = json!({ "path": path.to_string_lossy() });
        self.request("screenshot", None, payload, None).await?;
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.request("close", None, json!({}), None).await;
        self.closed = true;
        let _ = tokio::time::timeout(REPLY_GRACE, self.child.wait()).await;
        result.map(|_| ())
    }
}

impl Drop for PlaywrightPage {
    fn drop(&mut self) {
        if !self.closed {
            self.terminate();
        }
    }
}
