//! Probe Commands

use anyhow::Result;
use clap::Args;

use qa_trainer_e2e::target::wait_for_reachable;
use qa_trainer_e2e::E2eConfig;

use crate::output::{print_error, print_success};

#[derive(Args)]
pub struct ProbeArgs {
    /// Seconds to keep retrying
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Returns whether the target answered
pub async fn execute(args: ProbeArgs, config: &E2eConfig) -> Result<bool> {
    let mut target = config.target.clone();
    if let Some(timeout) = args.timeout {
        target.probe_timeout_secs = timeout;
    }

    match wait_for_reachable(&target).await {
        Ok(()) => {
            print_success(&format!("{} is reachable", target.base_url));
            Ok(true)
        }
        Err(e) => {
            print_error(&e.to_string());
            Ok(false)
        }
    }
}
