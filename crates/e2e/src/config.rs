//! Run configuration, loaded from TOML

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};
use crate::playwright::PlaywrightConfig;
use crate::runner::RunnerConfig;
use crate::spec::RegistrationData;
use crate::target::TargetConfig;

pub const BASE_URL_ENV: &str = "QA_TRAINER_BASE_URL";
pub const LOGIN_ENV: &str = "QA_TRAINER_LOGIN";
pub const EMAIL_ENV: &str = "QA_TRAINER_EMAIL";
pub const PASSWORD_ENV: &str = "QA_TRAINER_PASSWORD";

/// Everything a run needs besides the scenarios themselves
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    pub target: TargetConfig,
    pub browser: PlaywrightConfig,
    pub account: AccountConfig,
    pub output: OutputConfig,
}

/// The account the site database is seeded with before every run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub login: String,
    pub email: String,
    pub password: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            login: "o12o12".to_string(),
            email: "o12o12@mail.ru".to_string(),
            password: "o12o12".to_string(),
        }
    }
}

impl AccountConfig {
    pub fn registration(&self) -> RegistrationData {
        RegistrationData::new(&self.login, &self.email, &self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub screenshots_on_failure: bool,
    /// Default limit for URL waits
    pub wait_timeout_ms: u64,
    /// Limit for `visible` assertions
    pub visibility_timeout_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("test-results"),
            screenshots_on_failure: true,
            wait_timeout_ms: 30_000,
            visibility_timeout_ms: 5_000,
        }
    }
}

impl E2eConfig {
    /// Load configuration from file; a missing file yields defaults
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `QA_TRAINER_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(BASE_URL_ENV) {
            self.target.base_url = url;
        }
        if let Some(login) = lookup(LOGIN_ENV) {
            self.account.login = login;
        }
        if let Some(email) = lookup(EMAIL_ENV) {
            self.account.email = email;
        }
        if let Some(password) = lookup(PASSWORD_ENV) {
            self.account.password = password;
        }
    }

    pub fn validate(&self) -> E2eResult<()> {
        self.target.base()?;
        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            return Err(E2eError::Config("viewport must be non-empty".to_string()));
        }
        if self.account.email.trim().is_empty() || self.account.password.is_empty() {
            return Err(E2eError::Config(
                "account email and password are required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn runner_config(&self) -> E2eResult<RunnerConfig> {
        Ok(RunnerConfig {
            base_url: self.target.base()?,
            wait_timeout: Duration::from_millis(self.output.wait_timeout_ms),
            visibility_timeout: Duration::from_millis(self.output.visibility_timeout_ms),
            output_dir: self.output.dir.clone(),
            screenshots_on_failure: self.output.screenshots_on_failure,
        })
    }
}
