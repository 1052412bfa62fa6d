//! CLI Commands

pub mod list;
pub mod probe;
pub mod run;
pub mod validate;

use anyhow::Result;
use std::path::Path;

use qa_trainer_e2e::config::AccountConfig;
use qa_trainer_e2e::{catalog, Suite};

/// Suites from a YAML directory, or the built-in catalogue
pub fn load_suites(specs: Option<&Path>, account: &AccountConfig) -> Result<Vec<Suite>> {
    match specs {
        Some(dir) => Ok(Suite::load_all(dir)?),
        None => Ok(catalog::all(account)),
    }
}
