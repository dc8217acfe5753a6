//! tftest CLI - Main Entry Point
//!
//! Lists, lints, checks and runs directive-annotated Terraform fixtures.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tftest::RunnerConfig;

mod commands;
mod output;

use commands::{check, lint, list, run};

/// tftest - Terraform acceptance tests from annotated fixtures
#[derive(Parser)]
#[command(name = "tftest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "tftest.toml", global = true)]
    config: PathBuf,

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
    /// List the steps loaded from each fixture directory
    List(list::ListArgs),

    /// Load every fragment and report the ones that fail
    Lint(lint::LintArgs),

    /// Compare a fragment's snapshot with a `terraform show -json` document
    Check(check::CheckArgs),

    /// Execute every fixture directory with terraform
    Run(run::RunArgs),

    /// Write the effective configuration to the config file
    Init,
}

fn main() -> anyhow::Result<()> {
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

    let config = RunnerConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let options = config.test_options();

    let success = match cli.command {
        Commands::List(args) => {
            list::execute(args, config.fixtures_dir.clone(), options, cli.format)?;
            true
        }
        Commands::Lint(args) => lint::execute(args, config.fixtures_dir.clone(), options, cli.format)?,
        Commands::Check(args) => {
            check::execute(args, options)?;
            true
        }
        Commands::Run(args) => run::execute(args, config, options, cli.format)?,
        Commands::Init => {
            config.save(&cli.config)?;
            output::print_success(&format!("Configuration written to {}", cli.config.display()));
            true
        }
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
