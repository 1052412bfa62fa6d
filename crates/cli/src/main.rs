//! QA Trainer CLI - Main Entry Point
//!
//! Runs, lists and validates the declarative browser scenarios that
//! exercise the QA Trainer site.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

use commands::{list, probe, run, validate};
use qa_trainer_e2e::E2eConfig;

/// QA Trainer - declarative browser scenarios
#[derive(Parser)]
#[command(name = "qa-trainer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "qa-trainer.toml", global = true)]
    config: PathBuf,

    /// Base URL of the site under test
    #[arg(long, env = "QA_TRAINER_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Login of the seeded account
    #[arg(long, env = "QA_TRAINER_LOGIN", global = true)]
    login: Option<String>,

    /// E-mail of the seeded account
    #[arg(long, env = "QA_TRAINER_EMAIL", global = true)]
    email: Option<String>,

    /// Password of the seeded account
    #[arg(long, env = "QA_TRAINER_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios in a real browser
    Run(run::RunArgs),

    /// List scenarios without running them
    List(list::ListArgs),

    /// Check a directory of YAML suites
    Validate(validate::ValidateArgs),

    /// Check that the site answers
    Probe(probe::ProbeArgs),

    /// Show version information
    Version,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<E2eConfig> {
        let mut config = E2eConfig::load(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;

        if let Some(url) = &self.base_url {
            config.target.base_url = url.clone();
        }
        if let Some(login) = &self.login {
            config.account.login = login.clone();
        }
        if let Some(email) = &self.email {
            config.account.email = email.clone();
        }
        if let Some(password) = &self.password {
            config.account.password = password.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.load_config()?;

    match cli.command {
        Commands::Run(args) => {
            if !run::execute(args, config, cli.format).await? {
                std::process::exit(1);
            }
        }
        Commands::List(args) => list::execute(args, &config, cli.format)?,
        Commands::Validate(args) => validate::execute(args)?,
        Commands::Probe(args) => {
            if !probe::execute(args, &config).await? {
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("QA Trainer CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Declarative browser scenarios over Playwright");
            println!();
            println!("Default target: {}", config.target.base_url);
            println!("Browser: {}", config.browser.browser);
        }
    }

    Ok(())
}
