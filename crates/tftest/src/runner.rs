//! Test runner: one test case per fixture directory

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::TestOptions;
use crate::error::{Result, TfTestError};
use crate::scan::fixture_dirs;
use crate::step::{load_case, StepSummary, TestCase};

/// Executes loaded test cases against a live environment.
pub trait CaseExecutor {
    fn execute(&mut self, case: &TestCase) -> Result<()>;
}

/// Adjusts a test case after loading and before execution.
pub type CaseHook = Box<dyn FnMut(&Path, &mut TestCase)>;

/// Result of running a single fixture directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepSummary>,
    pub error: Option<String>,
}

/// Result of running all fixture directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

pub struct TestRunner<E> {
    fixtures_dir: PathBuf,
    output_dir: PathBuf,
    options: TestOptions,
    executor: E,
    hook: Option<CaseHook>,
}

impl<E: CaseExecutor> TestRunner<E> {
    pub fn new(fixtures_dir: impl Into<PathBuf>, options: TestOptions, executor: E) -> Self {
        Self {
            fixtures_dir: fixtures_dir.into(),
            output_dir: PathBuf::from("test-results"),
            options,
            executor,
            hook: None,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Install a hook that can customize each case before it runs.
    pub fn with_hook(mut self, hook: impl FnMut(&Path, &mut TestCase) + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run every fixture directory. Failures are recorded per directory and
    /// do not stop the suite; only a failed scan of the root is an error.
    pub fn run_all(&mut self) -> Result<TestSuiteResult> {
        let start = Instant::now();
        let dirs = fixture_dirs(&self.fixtures_dir, &self.options.extension)?;

        info!("Running {} test case(s)...", dirs.len());

        let mut results = Vec::with_capacity(dirs.len());
        for dir in &dirs {
            let result = self.run_dir(dir);
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(TestSuiteResult {
            total: results.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Load and execute one fixture directory.
    pub fn run_dir(&mut self, dir: &Path) -> TestResult {
        let start = Instant::now();
        debug!("Running test case: {}", dir.display());

        let mut steps = Vec::new();
        let outcome = match load_case(dir, &self.options) {
            Ok(mut case) => {
                if let Some(hook) = self.hook.as_mut() {
                    hook(dir, &mut case);
                }
                steps = case.steps.iter().map(|s| s.summary()).collect();
                self.executor.execute(&case)
            }
            Err(e) => Err(e),
        };

        TestResult {
            name: dir.display().to_string(),
            success: outcome.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    /// Write suite results to `test-results.json` in the output directory.
    pub fn write_results(&self, results: &TestSuiteResult) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|err| TfTestError::write(&self.output_dir, err))?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json).map_err(|err| TfTestError::write(&path, err))?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
