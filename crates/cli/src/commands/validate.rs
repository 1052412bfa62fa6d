//! Validate Commands

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use qa_trainer_e2e::Suite;

use crate::output::print_success;

#[derive(Args)]
pub struct ValidateArgs {
    /// Directory of YAML suites
    pub specs: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let suites = Suite::load_all(&args.specs)
        .with_context(|| format!("validating suites in {}", args.specs.display()))?;

    let scenarios: usize = suites.iter().map(|s| s.scenarios.len()).sum();
    print_success(&format!(
        "{} suite(s), {} scenario(s) valid in {}",
        suites.len(),
        scenarios,
        args.specs.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_suite_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("broken.yaml"),
            "name: broken\nscenarios: []\n",
        )
        .unwrap();

        let err = execute(ValidateArgs {
            specs: dir.path().to_path_buf(),
        })
        .unwrap_err();
        assert!(format!("{:#}", err).contains("suite has no scenarios"));
    }

    #[test]
    fn test_valid_suite_passes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("auth.yaml"),
            r#"
name: auth
scenarios:
  - name: right Auth
    actions:
      - action: navigate
        url: /
    assertions:
      - assert: url_contains
        expected: /
"#,
        )
        .unwrap();

        execute(ValidateArgs {
            specs: dir.path().to_path_buf(),
        })
        .unwrap();
    }
}
