//! Run Command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tftest::{RunnerConfig, TerraformExecutor, TestOptions, TestResult, TestRunner};
use tracing::info;

use crate::output::{print_error, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Fixture root (defaults to the configured fixtures_dir)
    pub dir: Option<PathBuf>,

    /// Rewrite snapshots from live state instead of comparing
    /// (same as setting TFTEST_REFRESH_STATE)
    #[arg(long)]
    pub refresh: bool,

    /// Output directory for results (defaults to the configured output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the post-apply empty plan check
    #[arg(long)]
    pub no_idempotency: bool,
}

#[derive(Serialize)]
struct ResultRow<'a>(&'a TestResult);

impl TableDisplay for ResultRow<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Case", "Steps", "Result", "Duration"]
    }

    fn row(&self) -> Vec<String> {
        let result = if self.0.success {
            "pass".to_string()
        } else {
            format!("FAIL: {}", self.0.error.as_deref().unwrap_or("unknown error"))
        };
        vec![
            self.0.name.clone(),
            self.0.steps.len().to_string(),
            result,
            format!("{} ms", self.0.duration_ms),
        ]
    }
}

/// Returns `false` when any case failed.
pub fn execute(args: RunArgs, config: RunnerConfig, options: TestOptions, format: OutputFormat) -> Result<bool> {
    let options = if args.refresh {
        options.with_refresh(true)
    } else {
        options
    };
    if options.refresh {
        info!("refresh mode: snapshots will be rewritten from live state");
    }

    let mut terraform = config.terraform.clone();
    if args.no_idempotency {
        terraform.check_idempotency = false;
    }
    let executor = TerraformExecutor::new(terraform);
    let version = executor.check_installed()?;
    info!("Using {}", version);

    let fixtures = args.dir.unwrap_or(config.fixtures_dir);
    let output = args.output.unwrap_or(config.output_dir);

    let mut runner = TestRunner::new(fixtures, options, executor).with_output_dir(output);
    let suite = runner.run_all()?;
    runner.write_results(&suite)?;

    let rows: Vec<ResultRow<'_>> = suite.results.iter().map(ResultRow).collect();
    print_list(&rows, format);

    if suite.success() {
        print_success(&format!("{} case(s) passed", suite.passed));
    } else {
        print_error(&format!("{} of {} case(s) failed", suite.failed, suite.total));
    }
    Ok(suite.success())
}
