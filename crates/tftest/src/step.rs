//! Test steps assembled from configuration fragments

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::check::StepCheck;
use crate::config::TestOptions;
use crate::directive::DirectiveSet;
use crate::error::{Result, TfTestError};
use crate::lexer;
use crate::scan::find_fixtures;
use crate::snapshot::{snapshot_path, Snapshot};

/// One step of an acceptance test
#[derive(Debug, Clone, Default)]
pub struct TestStep {
    /// Configuration to apply
    pub config: String,

    /// The apply must fail with an error matching this pattern
    pub expect_error: Option<Regex>,

    /// Run against the state after a successful apply
    pub check: Option<StepCheck>,

    /// Import `resource_name` instead of applying
    pub import_state: bool,

    /// Compare imported attributes with the applied ones
    pub import_state_verify: bool,

    /// Resource address used by import steps
    pub resource_name: Option<String>,

    /// Fragment this step was loaded from
    pub source: PathBuf,
}

impl TestStep {
    pub fn summary(&self) -> StepSummary {
        let (kind, checks) = match &self.check {
            _ if self.import_state => (StepKind::Import, Vec::new()),
            Some(StepCheck::Refresh { names, .. }) => {
                (StepKind::Refresh, names.iter().cloned().collect())
            }
            Some(StepCheck::Assert { checks, .. }) => {
                (StepKind::Apply, checks.iter().map(ToString::to_string).collect())
            }
            None => (StepKind::Apply, Vec::new()),
        };
        StepSummary {
            source: self.source.clone(),
            kind,
            expect_error: self.expect_error.as_ref().map(|re| re.as_str().to_string()),
            resource_name: self.resource_name.clone(),
            checks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Apply,
    Refresh,
    Import,
}

/// Serializable description of a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    pub source: PathBuf,
    pub kind: StepKind,
    pub expect_error: Option<String>,
    pub resource_name: Option<String>,
    pub checks: Vec<String>,
}

/// All steps of one fixture directory, in order
#[derive(Debug, Clone, Default)]
pub struct TestCase {
    pub dir: PathBuf,
    pub steps: Vec<TestStep>,
}

impl TestCase {
    pub fn name(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Load a test case from every fragment under `dir`.
pub fn load_case(dir: &Path, opts: &TestOptions) -> Result<TestCase> {
    let steps = load_test_steps(dir, opts)?;
    info!(dir = %dir.display(), steps = steps.len(), "loaded test case");
    Ok(TestCase {
        dir: dir.to_path_buf(),
        steps,
    })
}

/// Load the steps of every fragment under `dir`, ordered by path.
pub fn load_test_steps(dir: &Path, opts: &TestOptions) -> Result<Vec<TestStep>> {
    let mut steps = Vec::new();
    for file in find_fixtures(dir, &opts.extension)? {
        let loaded = load_test_step(&file, opts).map_err(|e| TfTestError::LoadStep(Box::new(e)))?;
        steps.extend(loaded);
    }
    Ok(steps)
}

/// Load one fragment: the apply step, followed by an import step when the
/// fragment carries an `Import` directive.
pub fn load_test_step(path: &Path, opts: &TestOptions) -> Result<Vec<TestStep>> {
    let config = std::fs::read_to_string(path).map_err(|err| TfTestError::read(path, err))?;
    let abs_path = std::path::absolute(path).map_err(|err| TfTestError::read(path, err))?;

    let comments = lexer::comments(&config, path)?;
    let directives = DirectiveSet::extract(&comments, path)?;
    if directives.is_empty() {
        return Err(TfTestError::NoDirectives {
            path: path.to_path_buf(),
        });
    }
    debug!(
        path = %path.display(),
        checks = directives.checks.len(),
        expect_error = directives.expect_error.is_some(),
        import = directives.import.is_some(),
        "parsed directives"
    );

    let DirectiveSet {
        expect_error,
        checks: names,
        import,
    } = directives;

    let mut step = TestStep {
        config,
        expect_error,
        source: abs_path.clone(),
        ..Default::default()
    };

    let snapshot_file = snapshot_path(path);

    if opts.refresh {
        step.check = Some(StepCheck::Refresh {
            snapshot: snapshot_file,
            names,
            ignore: opts.ignore_change.clone(),
        });
        return Ok(vec![step]);
    }

    if let Some(snapshot) = Snapshot::load(&snapshot_file)? {
        step.check = Some(StepCheck::Assert {
            source: abs_path.clone(),
            checks: snapshot.checks(&names, opts.ignore_change.as_ref()),
        });
    }

    let mut steps = Vec::with_capacity(2);
    let import_step = import.map(|resource| TestStep {
        config: step.config.clone(),
        import_state: true,
        import_state_verify: true,
        resource_name: Some(resource),
        source: abs_path,
        ..Default::default()
    });
    steps.push(step);
    steps.extend(import_step);
    Ok(steps)
}
