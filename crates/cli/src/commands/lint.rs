//! Lint Command

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tftest::{find_fixtures, load_test_step, TestOptions};

use crate::output::{print_error, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct LintArgs {
    /// Fixture root (defaults to the configured fixtures_dir)
    pub dir: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct LintReport {
    pub file: PathBuf,
    pub steps: usize,
    pub error: Option<String>,
}

impl TableDisplay for LintReport {
    fn headers() -> Vec<&'static str> {
        vec!["File", "Steps", "Status"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.file.display().to_string(),
            self.steps.to_string(),
            self.error.clone().unwrap_or_else(|| "ok".to_string()),
        ]
    }
}

/// Load every fragment on its own so that all problems are reported.
pub fn lint(root: &Path, options: &TestOptions) -> Result<Vec<LintReport>> {
    let reports = find_fixtures(root, &options.extension)?
        .into_iter()
        .map(|file| match load_test_step(&file, options) {
            Ok(steps) => LintReport {
                file,
                steps: steps.len(),
                error: None,
            },
            Err(e) => LintReport {
                file,
                steps: 0,
                error: Some(e.to_string()),
            },
        })
        .collect();
    Ok(reports)
}

/// Returns `false` when any fragment failed to load.
pub fn execute(args: LintArgs, root: PathBuf, options: TestOptions, format: OutputFormat) -> Result<bool> {
    let root = args.dir.unwrap_or(root);
    // Linting never writes snapshots.
    let options = options.with_refresh(false);
    let reports = lint(&root, &options)?;
    print_list(&reports, format);

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed == 0 {
        print_success(&format!("{} fragment(s) loaded", reports.len()));
        Ok(true)
    } else {
        print_error(&format!("{} of {} fragment(s) failed to load", failed, reports.len()));
        Ok(false)
    }
}
