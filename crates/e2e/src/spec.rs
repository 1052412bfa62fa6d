//! Declarative scenario model and its YAML form

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;

/// A named group of scenarios sharing a setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags applied to every member scenario when filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Run before each member scenario, on the member's own page
    #[serde(default)]
    pub setup: Option<Scenario>,

    pub scenarios: Vec<Scenario>,
}

/// One independent test case: ordered actions, then ordered assertions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub actions: Vec<Action>,

    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

/// A single UI-mutating or UI-waiting step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Navigate to a URL (relative paths resolve against the base URL)
    Navigate { url: String },

    /// Fill an input field
    Fill { selector: Locator, value: String },

    /// Click an element
    Click { selector: Locator },

    /// Press a key with an element focused
    Press { selector: Locator, key: String },

    /// Check a checkbox
    Check { selector: Locator },

    /// Block until the page URL matches
    WaitForUrl {
        url: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

/// A single expected-vs-actual comparison against page state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "assert", rename_all = "snake_case")]
pub enum Assertion {
    /// Element inner text equals `expected` exactly
    TextEquals { selector: Locator, expected: String },

    /// Attribute value matches a regular expression
    AttributeMatches {
        selector: Locator,
        attribute: String,
        pattern: String,
    },

    /// Attribute value equals `expected` exactly
    AttributeEquals {
        selector: Locator,
        attribute: String,
        expected: String,
    },

    /// Element is visible
    Visible { selector: Locator },

    /// Number of matching elements
    CountEquals { selector: Locator, expected: usize },

    /// Computed layout value equals `expected` within `tolerance`
    NumericEquals {
        measure: Measure,
        expected: f64,
        #[serde(default)]
        tolerance: f64,
    },

    /// Computed layout value is strictly greater than `threshold`
    NumericGreaterThan { measure: Measure, threshold: f64 },

    /// Current page URL contains `expected`
    UrlContains { expected: String },

    /// The link target, minus `scheme`, appears in the link text once the
    /// text is reduced to digits and `+`
    HrefMatchesText { selector: Locator, scheme: String },
}

/// A number derived from page layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Pixels between the bottom edge of `upper` and the top edge of `lower`
    VerticalGap { upper: Locator, lower: Locator },
}

/// Values typed into the registration form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationData {
    pub login: String,
    pub email: String,
    pub password: String,
}

impl RegistrationData {
    pub fn new(
        login: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            login: login.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl Action {
    /// Short label used in step results and logs
    pub fn describe(&self) -> String {
        match self {
            Action::Navigate { url } => format!("navigate:{}", url),
            Action::Fill { selector, .. } => format!("fill:{}", selector),
            Action::Click { selector } => format!("click:{}", selector),
            Action::Press { selector, key } => format!("press:{}:{}", selector, key),
            Action::Check { selector } => format!("check:{}", selector),
            Action::WaitForUrl { url, .. } => format!("wait_for_url:{}", url),
        }
    }
}

impl Assertion {
    pub fn describe(&self) -> String {
        match self {
            Assertion::TextEquals { selector, .. } => format!("text_equals:{}", selector),
            Assertion::AttributeMatches {
                selector, attribute, ..
            } => format!("attribute_matches:{}@{}", selector, attribute),
            Assertion::AttributeEquals {
                selector, attribute, ..
            } => format!("attribute_equals:{}@{}", selector, attribute),
            Assertion::Visible { selector } => format!("visible:{}", selector),
            Assertion::CountEquals { selector, .. } => format!("count_equals:{}", selector),
            Assertion::NumericEquals { measure, .. } => format!("numeric_equals:{}", measure),
            Assertion::NumericGreaterThan { measure, .. } => {
                format!("numeric_greater_than:{}", measure)
            }
            Assertion::UrlContains { expected } => format!("url_contains:{}", expected),
            Assertion::HrefMatchesText { selector, .. } => {
                format!("href_matches_text:{}", selector)
            }
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Assertion::AttributeMatches { pattern, .. } => regex::Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| format!("bad pattern '{}': {}", pattern, e)),
            Assertion::NumericEquals { tolerance, .. } if *tolerance < 0.0 => {
                Err(format!("negative tolerance {}", tolerance))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::VerticalGap { upper, lower } => {
                write!(f, "vertical_gap({} -> {})", upper, lower)
            }
        }
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            actions: Vec::new(),
            assertions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("scenario name is empty".to_string());
        }
        for assertion in &self.assertions {
            assertion
                .validate()
                .map_err(|e| format!("scenario '{}': {}", self.name, e))?;
        }
        Ok(())
    }
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            setup: None,
            scenarios: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_setup(mut self, setup: Scenario) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Check the invariants a loaded suite must hold
    pub fn validate(&self) -> E2eResult<()> {
        let fail = |reason: String| E2eError::InvalidSuite {
            suite: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(fail("suite name is empty".to_string()));
        }
        if self.scenarios.is_empty() {
            return Err(fail("suite has no scenarios".to_string()));
        }

        if let Some(setup) = &self.setup {
            setup.validate().map_err(|e| fail(format!("setup: {}", e)))?;
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            scenario.validate().map_err(fail)?;
            if !seen.insert(scenario.name.as_str()) {
                return Err(fail(format!("duplicate scenario name '{}'", scenario.name)));
            }
        }

        Ok(())
    }

    /// Whether a member scenario carries `tag`, directly or through the suite
    pub fn scenario_has_tag(&self, scenario: &Scenario, tag: &str) -> bool {
        self.tags.iter().chain(scenario.tags.iter()).any(|t| t == tag)
    }

    /// Parse and validate a suite from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let suite: Self = serde_yaml::from_str(yaml)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            E2eError::Yaml(inner) => {
                E2eError::SpecParse(format!("{}: {}", path.display(), inner))
            }
            other => other,
        })
    }

    /// Load every suite under a directory, ordered by path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(E2eError::SpecParse(format!(
                "Spec directory not found: {}",
                dir.display()
            )));
        }

        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        let mut suites: Vec<Self> = Vec::with_capacity(paths.len());
        for path in paths {
            let suite = Self::from_file(&path)?;
            if suites.iter().any(|s| s.name == suite.name) {
                return Err(E2eError::InvalidSuite {
                    suite: suite.name,
                    reason: format!("defined more than once ({})", path.display()),
                });
            }
            suites.push(suite);
        }

        Ok(suites)
    }
}
