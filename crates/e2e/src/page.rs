//! Browser page abstraction the runner drives

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::E2eResult;
use crate::locator::Locator;

/// Element geometry in CSS pixels, relative to the main frame viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// A live page in an isolated browser context.
///
/// Element lookups that find nothing return [`crate::E2eError::Locator`];
/// waits that expire return [`crate::E2eError::Timeout`].
#[async_trait]
pub trait Page: Send {
    async fn goto(&mut self, url: &str) -> E2eResult<()>;

    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()>;

    async fn click(&mut self, locator: &Locator) -> E2eResult<()>;

    async fn press(&mut self, locator: &Locator, key: &str) -> E2eResult<()>;

    async fn check(&mut self, locator: &Locator) -> E2eResult<()>;

    /// Block until the page URL matches `pattern` (exact URL or glob)
    async fn wait_for_url(&mut self, pattern: &str, timeout: Duration) -> E2eResult<()>;

    async fn url(&mut self) -> E2eResult<String>;

    async fn inner_text(&mut self, locator: &Locator) -> E2eResult<String>;

    /// `None` when the element exists but lacks the attribute
    async fn attribute(&mut self, locator: &Locator, name: &str) -> E2eResult<Option<String>>;

    /// Waits up to `timeout` for the element to become visible
    async fn is_visible(&mut self, locator: &Locator, timeout: Duration) -> E2eResult<bool>;

    async fn count(&mut self, locator: &Locator) -> E2eResult<usize>;

    /// `None` when the element is not rendered
    async fn bounding_box(&mut self, locator: &Locator) -> E2eResult<Option<BoundingBox>>;

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()>;

    async fn close(&mut self) -> E2eResult<()>;
}

/// Opens fresh pages, one per scenario
#[async_trait]
pub trait Browser: Send + Sync {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>>;
}
