//! Scenario runner: setup, actions, assertions, in that order

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::E2eResult;
use crate::expect::{Evaluator, StepFailure};
use crate::page::{Browser, Page};
use crate::spec::{Action, Assertion, Scenario, Suite};
use crate::target::resolve_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    Setup,
    Action,
    Assertion,
}

/// Result of executing one action or assertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub phase: StepPhase,
    /// Position within its phase
    pub index: usize,
    pub step_name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub failure: Option<StepFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotArtifact {
    pub path: PathBuf,
    pub sha256: String,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub suite: String,
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub screenshot: Option<ScreenshotArtifact>,
}

impl ScenarioResult {
    /// The failing step, if any
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| !s.success)
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub base_url: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Which scenarios to run; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub suite: Option<String>,
    /// Substring of the scenario name
    pub scenario: Option<String>,
    pub tag: Option<String>,
}

impl RunFilter {
    pub fn matches(&self, suite: &Suite, scenario: &Scenario) -> bool {
        if let Some(name) = &self.suite {
            if &suite.name != name {
                return false;
            }
        }
        if let Some(needle) = &self.scenario {
            if !scenario.name.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !suite.scenario_has_tag(scenario, tag) {
                return false;
            }
        }
        true
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub base_url: Url,
    /// Default limit for `wait_for_url` actions without their own timeout
    pub wait_timeout: Duration,
    /// How long `visible` assertions wait for the element
    pub visibility_timeout: Duration,
    pub output_dir: PathBuf,
    pub screenshots_on_failure: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://pre.pasdel.ru/").expect("static URL"),
            wait_timeout: Duration::from_secs(30),
            visibility_timeout: Duration::from_secs(5),
            output_dir: PathBuf::from("test-results"),
            screenshots_on_failure: true,
        }
    }
}

/// Runs scenarios strictly in order, one fresh page each
pub struct TestRunner {
    config: RunnerConfig,
}

impl TestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every scenario of `suites` that passes `filter`
    pub async fn run_suites(
        &self,
        browser: &dyn Browser,
        suites: &[Suite],
        filter: &RunFilter,
    ) -> E2eResult<RunReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::new();
        let mut total = 0;
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for suite in suites {
            for scenario in &suite.scenarios {
                total += 1;
                if !filter.matches(suite, scenario) {
                    skipped += 1;
                    continue;
                }

                let result = self.run_on_fresh_page(browser, suite, scenario).await;
                if result.success {
                    passed += 1;
                    info!("✓ {} / {} ({} ms)", result.suite, result.name, result.duration_ms);
                } else {
                    failed += 1;
                    error!(
                        "✗ {} / {} - {}",
                        result.suite,
                        result.name,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                results.push(result);
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        Ok(RunReport {
            started_at,
            base_url: self.config.base_url.to_string(),
            total,
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        })
    }

    async fn run_on_fresh_page(
        &self,
        browser: &dyn Browser,
        suite: &Suite,
        scenario: &Scenario,
    ) -> ScenarioResult {
        let mut page = match browser.new_page().await {
            Ok(page) => page,
            Err(e) => {
                return ScenarioResult {
                    suite: suite.name.clone(),
                    name: scenario.name.clone(),
                    success: false,
                    duration_ms: 0,
                    steps: vec![],
                    error: Some(format!("could not open page: {}", e)),
                    screenshot: None,
                }
            }
        };

        let mut result = self
            .run_scenario(page.as_mut(), &suite.name, suite.setup.as_ref(), scenario)
            .await;

        if !result.success && self.config.screenshots_on_failure {
            result.screenshot = self
                .capture_failure(page.as_mut(), &suite.name, &scenario.name)
                .await;
        }

        if let Err(e) = page.close().await {
            warn!("Closing page for '{}' failed: {}", scenario.name, e);
        }

        result
    }

    /// Run one scenario on an already open page. Stops at the first failing step.
    pub async fn run_scenario(
        &self,
        page: &mut dyn Page,
        suite: &str,
        setup: Option<&Scenario>,
        scenario: &Scenario,
    ) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {} / {}", suite, scenario.name);

        let mut steps = Vec::new();
        let setup_ok = match setup {
            Some(setup) => {
                self.run_actions(page, StepPhase::Setup, &setup.actions, &mut steps)
                    .await
                    && self
                        .run_assertions(page, StepPhase::Setup, &setup.assertions, &mut steps)
                        .await
            }
            None => true,
        };

        let success = setup_ok
            && self
                .run_actions(page, StepPhase::Action, &scenario.actions, &mut steps)
                .await
            && self
                .run_assertions(page, StepPhase::Assertion, &scenario.assertions, &mut steps)
                .await;

        let error = steps.iter().find(|s| !s.success).map(|step| {
            let reason = step
                .failure
                .as_ref()
                .map(|f| f.to_string())
                .unwrap_or_default();
            format!("{} failed: {}", step.step_name, reason)
        });

        ScenarioResult {
            suite: suite.to_string(),
            name: scenario.name.clone(),
            success,
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error,
            screenshot: None,
        }
    }

    async fn run_actions(
        &self,
        page: &mut dyn Page,
        phase: StepPhase,
        actions: &[Action],
        steps: &mut Vec<StepResult>,
    ) -> bool {
        for (index, action) in actions.iter().enumerate() {
            let start = Instant::now();
            let step_name = action.describe();
            debug!("Executing step: {}", step_name);

            let failure = self.perform(page, action).await.err().map(StepFailure::from);
            let success = failure.is_none();
            steps.push(StepResult {
                phase,
                index,
                step_name,
                success,
                duration_ms: start.elapsed().as_millis() as u64,
                failure,
            });

            if !success {
                return false;
            }
        }
        true
    }

    async fn run_assertions(
        &self,
        page: &mut dyn Page,
        phase: StepPhase,
        assertions: &[Assertion],
        steps: &mut Vec<StepResult>,
    ) -> bool {
        let evaluator = Evaluator {
            base: &self.config.base_url,
            visibility_timeout: self.config.visibility_timeout,
        };

        for (index, assertion) in assertions.iter().enumerate() {
            let start = Instant::now();
            let step_name = assertion.describe();
            debug!("Checking: {}", step_name);

            let failure = evaluator.evaluate(page, assertion).await.err();
            let success = failure.is_none();
            steps.push(StepResult {
                phase,
                index,
                step_name,
                success,
                duration_ms: start.elapsed().as_millis() as u64,
                failure,
            });

            if !success {
                return false;
            }
        }
        true
    }

    async fn perform(&self, page: &mut dyn Page, action: &Action) -> E2eResult<()> {
        match action {
            Action::Navigate { url } => {
                let url = resolve_url(&self.config.base_url, url)?;
                page.goto(&url).await
            }
            Action::Fill { selector, value } => page.fill(selector, value).await,
            Action::Click { selector } => page.click(selector).await,
            Action::Press { selector, key } => page.press(selector, key).await,
            Action::Check { selector } => page.check(selector).await,
            Action::WaitForUrl { url, timeout_ms } => {
                let url = resolve_url(&self.config.base_url, url)?;
                let timeout = timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(self.config.wait_timeout);
                page.wait_for_url(&url, timeout).await
            }
        }
    }

    async fn capture_failure(
        &self,
        page: &mut dyn Page,
        suite: &str,
        scenario: &str,
    ) -> Option<ScreenshotArtifact> {
        let dir = self.config.output_dir.join("screenshots");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("Cannot create {}: {}", dir.display(), e);
            return None;
        }

        let path = dir.join(format!("{}--{}.png", slug(suite), slug(scenario)));
        if let Err(e) = page.screenshot(&path).await {
            warn!("Failure screenshot for '{}' not taken: {}", scenario, e);
            return None;
        }

        match hash_file(&path) {
            Ok(sha256) => Some(ScreenshotArtifact { path, sha256 }),
            Err(e) => {
                warn!("Cannot read screenshot {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write the report as `test-results.json` in the output directory
    pub fn write_report(&self, report: &RunReport) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}
