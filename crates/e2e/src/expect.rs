//! Assertion evaluation against live page state

use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::E2eError;
use crate::page::Page;
use crate::spec::{Assertion, Measure};
use crate::target::resolve_url;

const MISSING: &str = "<missing>";

/// Why a step did not pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepFailure {
    /// Observed page state differs from the expected literal
    Mismatch { expected: String, actual: String },
    /// The element could not be found or was ambiguous
    Locator { locator: String, message: String },
    Timeout { message: String },
    /// A layout measurement had no element to measure
    LayoutUnavailable { message: String },
    /// Any other browser or bridge error
    Driver { message: String },
}

impl StepFailure {
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        StepFailure::Mismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl From<E2eError> for StepFailure {
    fn from(err: E2eError) -> Self {
        match err {
            E2eError::Locator { locator, message } => StepFailure::Locator { locator, message },
            E2eError::Timeout(message) => StepFailure::Timeout { message },
            E2eError::LayoutUnavailable(message) => StepFailure::LayoutUnavailable { message },
            other => StepFailure::Driver {
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepFailure::Mismatch { expected, actual } => {
                write!(f, "expected {:?}, got {:?}", expected, actual)
            }
            StepFailure::Locator { locator, message } => {
                write!(f, "locator {} failed: {}", locator, message)
            }
            StepFailure::Timeout { message } => write!(f, "timeout: {}", message),
            StepFailure::LayoutUnavailable { message } => {
                write!(f, "layout unavailable: {}", message)
            }
            StepFailure::Driver { message } => write!(f, "{}", message),
        }
    }
}

/// Reads page state for assertions
pub struct Evaluator<'a> {
    pub base: &'a Url,
    /// How long a visibility check may wait for the element to appear
    pub visibility_timeout: Duration,
}

impl Evaluator<'_> {
    pub async fn evaluate(
        &self,
        page: &mut dyn Page,
        assertion: &Assertion,
    ) -> Result<(), StepFailure> {
        match assertion {
            Assertion::TextEquals { selector, expected } => {
                let actual = page.inner_text(selector).await?;
                expect_eq(expected, &actual)
            }

            Assertion::AttributeMatches {
                selector,
                attribute,
                pattern,
            } => {
                let re = Regex::new(pattern).map_err(E2eError::from)?;
                match page.attribute(selector, attribute).await? {
                    Some(value) if re.is_match(&value) => Ok(()),
                    Some(value) => Err(StepFailure::mismatch(format!("/{}/", pattern), value)),
                    None => Err(StepFailure::mismatch(format!("/{}/", pattern), MISSING)),
                }
            }

            Assertion::AttributeEquals {
                selector,
                attribute,
                expected,
            } => match page.attribute(selector, attribute).await? {
                Some(value) => expect_eq(expected, &value),
                None => Err(StepFailure::mismatch(expected.as_str(), MISSING)),
            },

            Assertion::Visible { selector } => {
                if page.is_visible(selector, self.visibility_timeout).await? {
                    return Ok(());
                }
                // Counted after the wait so late-rendered elements still qualify
                if page.count(selector).await? == 0 {
                    return Err(StepFailure::Locator {
                        locator: selector.to_string(),
                        message: "no element matches".to_string(),
                    });
                }
                Err(StepFailure::mismatch("visible", "hidden"))
            }

            Assertion::CountEquals { selector, expected } => {
                let actual = page.count(selector).await?;
                if actual == *expected {
                    Ok(())
                } else {
                    Err(StepFailure::mismatch(expected.to_string(), actual.to_string()))
                }
            }

            Assertion::NumericEquals {
                measure,
                expected,
                tolerance,
            } => {
                let actual = measure_value(page, measure).await?;
                if (actual - expected).abs() <= *tolerance {
                    Ok(())
                } else {
                    Err(StepFailure::mismatch(expected.to_string(), actual.to_string()))
                }
            }

            Assertion::NumericGreaterThan { measure, threshold } => {
                let actual = measure_value(page, measure).await?;
                if actual > *threshold {
                    Ok(())
                } else {
                    Err(StepFailure::mismatch(
                        format!("> {}", threshold),
                        actual.to_string(),
                    ))
                }
            }

            Assertion::UrlContains { expected } => {
                let expected = if expected.starts_with('/') {
                    resolve_url(self.base, expected)?
                } else {
                    expected.clone()
                };
                let actual = page.url().await?;
                if actual.contains(&expected) {
                    Ok(())
                } else {
                    Err(StepFailure::mismatch(format!("*{}*", expected), actual))
                }
            }

            Assertion::HrefMatchesText { selector, scheme } => {
                let href = page
                    .attribute(selector, "href")
                    .await?
                    .ok_or_else(|| StepFailure::mismatch(format!("{}...", scheme), MISSING))?;
                let number = href.strip_prefix(scheme.as_str()).unwrap_or(&href);
                let text = page.inner_text(selector).await?;
                let digits = dial_digits(&text);
                if digits.contains(number) {
                    Ok(())
                } else {
                    Err(StepFailure::mismatch(number, digits))
                }
            }
        }
    }
}

fn expect_eq(expected: &str, actual: &str) -> Result<(), StepFailure> {
    if expected == actual {
        Ok(())
    } else {
        Err(StepFailure::mismatch(expected, actual))
    }
}

/// Keep only digits and `+`, the way a phone number is dialled
pub fn dial_digits(text: &str) -> String {
    static NON_DIAL: OnceLock<Regex> = OnceLock::new();
    let re = NON_DIAL.get_or_init(|| Regex::new(r"[^\d+]").expect("static pattern"));
    re.replace_all(text, "").into_owned()
}

async fn measure_value(page: &mut dyn Page, measure: &Measure) -> Result<f64, StepFailure> {
    match measure {
        Measure::VerticalGap { upper, lower } => {
            let upper_box = page.bounding_box(upper).await?;
            let lower_box = page.bounding_box(lower).await?;
            match (upper_box, lower_box) {
                (Some(upper_box), Some(lower_box)) => Ok(lower_box.y - upper_box.bottom()),
                _ => Err(E2eError::LayoutUnavailable(format!("{} or {}", upper, lower)).into()),
            }
        }
    }
}
