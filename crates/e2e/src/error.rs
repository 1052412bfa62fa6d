//! Error types for scenario execution

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Target {url} unreachable after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("Playwright not found. Install with: npm i -D playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Bridge closed unexpectedly: {0}")]
    BridgeClosed(String),

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Invalid suite '{suite}': {reason}")]
    InvalidSuite { suite: String, reason: String },

    #[error("Locator {locator} failed: {message}")]
    Locator { locator: String, message: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Required elements not found on the page: {0}")]
    LayoutUnavailable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
