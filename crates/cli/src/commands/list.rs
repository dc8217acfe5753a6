//! List Command

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tftest::step::{StepKind, StepSummary};
use tftest::{fixture_dirs, load_case, TestOptions};

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ListArgs {
    /// Fixture root (defaults to the configured fixtures_dir)
    pub dir: Option<PathBuf>,
}

/// One loaded step, for display
#[derive(Serialize)]
pub struct StepRow {
    pub case: String,
    #[serde(flatten)]
    pub step: StepSummary,
}

impl TableDisplay for StepRow {
    fn headers() -> Vec<&'static str> {
        vec!["Case", "File", "Kind", "Resource", "ExpectError", "Checks"]
    }

    fn row(&self) -> Vec<String> {
        let kind = match self.step.kind {
            StepKind::Apply => "apply",
            StepKind::Refresh => "refresh",
            StepKind::Import => "import",
        };
        vec![
            self.case.clone(),
            self.step
                .source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            kind.to_string(),
            self.step.resource_name.clone().unwrap_or_default(),
            self.step.expect_error.clone().unwrap_or_default(),
            self.step.checks.len().to_string(),
        ]
    }
}

/// Load every fixture directory under `root` into display rows.
pub fn collect(root: &Path, options: &TestOptions) -> Result<Vec<StepRow>> {
    let mut rows = Vec::new();
    for dir in fixture_dirs(root, &options.extension)? {
        let case = load_case(&dir, options)?;
        let name = dir
            .strip_prefix(root)
            .ok()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(dir.as_path())
            .display()
            .to_string();
        rows.extend(case.steps.iter().map(|step| StepRow {
            case: name.clone(),
            step: step.summary(),
        }));
    }
    Ok(rows)
}

pub fn execute(args: ListArgs, root: PathBuf, options: TestOptions, format: OutputFormat) -> Result<()> {
    let root = args.dir.unwrap_or(root);
    let rows = collect(&root, &options)?;
    print_list(&rows, format);
    Ok(())
}
