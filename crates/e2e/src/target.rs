//! Target site - URL resolution and reachability probing

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// The web application under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub base_url: String,

    /// Probe the base URL before running any scenario
    pub probe: bool,

    /// How long to keep probing
    pub probe_timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pre.pasdel.ru/".to_string(),
            probe: true,
            probe_timeout_secs: 30,
        }
    }
}

impl TargetConfig {
    pub fn base(&self) -> E2eResult<Url> {
        Url::parse(&self.base_url).map_err(|e| E2eError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Resolve a scenario URL: `/path` joins the base, absolute URLs pass through
pub fn resolve_url(base: &Url, url: &str) -> E2eResult<String> {
    let resolved = if url.starts_with('/') {
        base.join(url)
    } else {
        Url::parse(url)
    };

    resolved
        .map(|u| u.to_string())
        .map_err(|e| E2eError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Wait for the target to answer with a success status
pub async fn wait_for_reachable(config: &TargetConfig) -> E2eResult<()> {
    let base = config.base()?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    while start.elapsed() < config.probe_timeout() || attempts == 0 {
        attempts += 1;

        match client.get(base.clone()).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Target {} reachable ({})", base, resp.status());
                return Ok(());
            }
            Ok(resp) => {
                warn!("Target probe returned {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} ...", base);
                }
                if !e.is_connect() && !e.is_timeout() {
                    warn!("Target probe error: {}", e);
                }
            }
        }

        sleep(Duration::from_millis(250)).await;
    }

    Err(E2eError::TargetUnreachable {
        url: base.to_string(),
        attempts,
    })
}
