//! Run Commands

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use qa_trainer_e2e::playwright::{BrowserKind, PlaywrightBrowser};
use qa_trainer_e2e::target::wait_for_reachable;
use qa_trainer_e2e::{E2eConfig, RunFilter, RunReport, TestRunner};

use crate::output::{print_error, print_info, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Load suites from this directory instead of the built-in catalogue
    #[arg(short, long)]
    pub specs: Option<PathBuf>,

    /// Run only this suite
    #[arg(long)]
    pub suite: Option<String>,

    /// Run only scenarios whose name contains this text
    #[arg(short, long)]
    pub name: Option<String>,

    /// Run only scenarios with this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long)]
    pub browser: Option<BrowserKind>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Output directory for results
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the reachability probe
    #[arg(long)]
    pub no_probe: bool,
}

#[derive(Debug, Serialize)]
pub struct ResultRow {
    pub suite: String,
    pub scenario: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl TableDisplay for ResultRow {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Scenario", "Result", "Duration", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.suite.clone(),
            self.scenario.clone(),
            if self.success { "pass" } else { "FAIL" }.to_string(),
            format!("{}ms", self.duration_ms),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

pub fn result_rows(report: &RunReport) -> Vec<ResultRow> {
    report
        .results
        .iter()
        .map(|r| ResultRow {
            suite: r.suite.clone(),
            scenario: r.name.clone(),
            success: r.success,
            duration_ms: r.duration_ms,
            error: r.error.clone(),
        })
        .collect()
}

fn apply_overrides(config: &mut E2eConfig, args: &RunArgs) {
    if let Some(browser) = args.browser {
        config.browser.browser = browser;
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(output) = &args.output {
        config.output.dir = output.clone();
    }
    if args.no_probe {
        config.target.probe = false;
    }
}

/// Returns whether every selected scenario passed
pub async fn execute(args: RunArgs, mut config: E2eConfig, format: OutputFormat) -> Result<bool> {
    apply_overrides(&mut config, &args);
    config.validate()?;

    let suites = super::load_suites(args.specs.as_deref(), &config.account)?;

    if config.target.probe {
        wait_for_reachable(&config.target)
            .await
            .context("target is not reachable")?;
    }

    let browser = PlaywrightBrowser::new(config.browser.clone())?;
    let runner = TestRunner::new(config.runner_config()?);
    let filter = RunFilter {
        suite: args.suite,
        scenario: args.name,
        tag: args.tag,
    };

    info!(
        "Running against {} with {}",
        runner.config().base_url,
        config.browser.browser
    );
    let report = runner.run_suites(&browser, &suites, &filter).await?;
    let path = runner.write_report(&report)?;

    print_list(&result_rows(&report), format);

    if !format.is_machine_readable() {
        print_info(&format!("Report: {}", path.display()));
        if report.success() {
            print_success(&summary(&report));
        } else {
            print_error(&summary(&report));
        }
    }

    Ok(report.success())
}

fn summary(report: &RunReport) -> String {
    format!(
        "{} passed, {} failed, {} skipped in {}ms",
        report.passed, report.failed, report.skipped, report.duration_ms
    )
}
