//! List Commands

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use qa_trainer_e2e::{E2eConfig, RunFilter, Suite};

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ListArgs {
    /// Load suites from this directory instead of the built-in catalogue
    #[arg(short, long)]
    pub specs: Option<PathBuf>,

    /// Only scenarios with this tag
    #[arg(short, long)]
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioRow {
    pub suite: String,
    pub scenario: String,
    pub tags: Vec<String>,
    pub setup: bool,
    pub actions: usize,
    pub assertions: usize,
}

impl TableDisplay for ScenarioRow {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Scenario", "Tags", "Setup", "Actions", "Assertions"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.suite.clone(),
            self.scenario.clone(),
            self.tags.join(", "),
            if self.setup { "yes" } else { "-" }.to_string(),
            self.actions.to_string(),
            self.assertions.to_string(),
        ]
    }
}

/// One row per scenario that passes `filter`
pub fn rows(suites: &[Suite], filter: &RunFilter) -> Vec<ScenarioRow> {
    suites
        .iter()
        .flat_map(|suite| {
            suite
                .scenarios
                .iter()
                .filter(move |scenario| filter.matches(suite, scenario))
                .map(move |scenario| ScenarioRow {
                    suite: suite.name.clone(),
                    scenario: scenario.name.clone(),
                    tags: suite.tags.iter().chain(&scenario.tags).cloned().collect(),
                    setup: suite.setup.is_some(),
                    actions: scenario.actions.len(),
                    assertions: scenario.assertions.len(),
                })
        })
        .collect()
}

pub fn execute(args: ListArgs, config: &E2eConfig, format: OutputFormat) -> Result<()> {
    let suites = super::load_suites(args.specs.as_deref(), &config.account)?;
    let filter = RunFilter {
        tag: args.tag,
        ..Default::default()
    };
    print_list(&rows(&suites, &filter), format);
    Ok(())
}
