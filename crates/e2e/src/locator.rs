//! Element locators in Playwright selector notation
//!
//! Scenario files carry selectors as plain strings. They are parsed once, at
//! load time, into a [`Locator`] so that malformed selectors are rejected
//! before a browser is ever launched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{E2eError, E2eResult};

const XPATH_PREFIX: &str = "xpath=";
const ROLE_PREFIX: &str = "role=";
const TEXT_PREFIX: &str = "text=";

/// How an element is found on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    /// CSS selector, passed through verbatim (`>> nth=0` chaining included)
    Css(String),
    /// XPath expression, without the `xpath=` prefix
    XPath(String),
    /// ARIA role with an optional accessible name
    Role { role: String, name: Option<String> },
    /// Visible text
    Text(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Playwright: `page.getByRole(role, { name })`
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Parse a selector string
    pub fn parse(selector: &str) -> E2eResult<Self> {
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(invalid(selector, "selector is empty"));
        }

        if let Some(expr) = trimmed.strip_prefix(XPATH_PREFIX) {
            if expr.trim().is_empty() {
                return Err(invalid(selector, "xpath expression is empty"));
            }
            return Ok(Self::XPath(expr.to_string()));
        }

        if let Some(text) = trimmed.strip_prefix(TEXT_PREFIX) {
            if text.is_empty() {
                return Err(invalid(selector, "text is empty"));
            }
            return Ok(Self::Text(text.to_string()));
        }

        if let Some(rest) = trimmed.strip_prefix(ROLE_PREFIX) {
            return parse_role(selector, rest);
        }

        Ok(Self::Css(trimmed.to_string()))
    }

    /// Render as the JSON shape the Playwright bridge resolves
    pub fn to_bridge_json(&self) -> serde_json::Value {
        match self {
            Locator::Css(selector) => serde_json::json!({ "kind": "css", "value": selector }),
            Locator::XPath(expr) => serde_json::json!({ "kind": "xpath", "value": expr }),
            Locator::Role { role, name } => {
                serde_json::json!({ "kind": "role", "role": role, "name": name })
            }
            Locator::Text(text) => serde_json::json!({ "kind": "text", "value": text }),
        }
    }
}

fn parse_role(selector: &str, rest: &str) -> E2eResult<Locator> {
    let (role, name) = match rest.find('[') {
        None => (rest, None),
        Some(open) => {
            let clause = &rest[open..];
            let name = clause
                .strip_prefix("[name=\"")
                .and_then(|c| c.strip_suffix("\"]"))
                .ok_or_else(|| invalid(selector, "expected [name=\"...\"] after role"))?;
            (&rest[..open], Some(name.to_string()))
        }
    };

    if role.trim().is_empty() {
        return Err(invalid(selector, "role is empty"));
    }

    Ok(Locator::Role {
        role: role.trim().to_string(),
        name,
    })
}

fn invalid(selector: &str, reason: &str) -> E2eError {
    E2eError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "{}", selector),
            Locator::XPath(expr) => write!(f, "{}{}", XPATH_PREFIX, expr),
            Locator::Role { role, name: Some(name) } => {
                write!(f, "{}{}[name=\"{}\"]", ROLE_PREFIX, role, name)
            }
            Locator::Role { role, name: None } => write!(f, "{}{}", ROLE_PREFIX, role),
            Locator::Text(text) => write!(f, "{}{}", TEXT_PREFIX, text),
        }
    }
}

impl FromStr for Locator {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locator {
    type Error = E2eError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}
