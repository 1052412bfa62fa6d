//! QA Trainer E2E scenarios
//!
//! This crate provides a Rust-controlled scenario runner that:
//! - Describes test cases declaratively (actions, then assertions)
//! - Groups them into suites with a shared per-scenario setup
//! - Drives a real browser through a Playwright bridge process
//! - Reports every step with expected/actual values on failure
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TestRunner (Rust)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  run_suites(browser, suites, filter) -> RunReport           │
//! │    └── per scenario: Browser::new_page() -> Page            │
//! │          ├── setup actions + assertions                     │
//! │          ├── actions:    navigate | fill | click | press    │
//! │          │               check | wait_for_url               │
//! │          └── assertions: text | attribute | visible | count │
//! │                          numeric | url | href/text          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightPage ──JSON lines──> node bridge.js -> browser   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod expect;
pub mod locator;
pub mod page;
pub mod playwright;
pub mod runner;
pub mod spec;
pub mod target;

pub use config::E2eConfig;
pub use error::{E2eError, E2eResult};
pub use expect::StepFailure;
pub use locator::Locator;
pub use page::{BoundingBox, Browser, Page};
pub use runner::{RunFilter, RunReport, ScenarioResult, TestRunner};
pub use spec::{Action, Assertion, Measure, RegistrationData, Scenario, Suite};
