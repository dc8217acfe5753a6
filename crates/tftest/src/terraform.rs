//! Terraform CLI executor
//!
//! Each case runs in its own temporary working directory:
//!
//! ```text
//! apply step   write main.tf -> init -> apply -> [plan -detailed-exitcode] -> show -json -> check
//! import step  fresh dir -> write main.tf -> init -> import <addr> <id> -> show -json -> verify
//! end of case  destroy
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Output};

use regex::Regex;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::TerraformConfig;
use crate::error::{Result, TfTestError};
use crate::runner::CaseExecutor;
use crate::state::State;
use crate::step::{TestCase, TestStep};

const CONFIG_FILE: &str = "main.tf";

pub struct TerraformExecutor {
    config: TerraformConfig,
}

impl TerraformExecutor {
    pub fn new(config: TerraformConfig) -> Self {
        Self { config }
    }

    /// Verify the terraform binary can be run.
    pub fn check_installed(&self) -> Result<String> {
        let output = Command::new(&self.config.binary)
            .arg("version")
            .output()
            .map_err(|e| {
                TfTestError::TerraformNotFound(format!("{}: {}", self.config.binary.display(), e))
            })?;
        if !output.status.success() {
            return Err(TfTestError::TerraformNotFound(
                self.config.binary.display().to_string(),
            ));
        }
        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        debug!("Using {}", version);
        Ok(version)
    }

    fn command(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        debug!(dir = %dir.display(), "terraform {}", args.join(" "));
        Command::new(&self.config.binary)
            .args(args)
            .current_dir(dir)
            .envs(&self.config.env)
            .env("TF_IN_AUTOMATION", "1")
            .output()
            .map_err(|e| {
                TfTestError::TerraformNotFound(format!("{}: {}", self.config.binary.display(), e))
            })
    }

    /// Run a command that must succeed.
    fn run(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        let output = self.command(dir, args)?;
        if !output.status.success() {
            return Err(TfTestError::Terraform {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    fn write_config(&self, dir: &Path, config: &str) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        std::fs::write(&path, config).map_err(|err| TfTestError::write(path, err))
    }

    fn init(&self, dir: &Path) -> Result<()> {
        self.run(dir, &["init", "-input=false", "-no-color"])?;
        Ok(())
    }

    fn init_output(&self, dir: &Path) -> Result<Output> {
        self.command(dir, &["init", "-input=false", "-no-color"])
    }

    fn show(&self, dir: &Path) -> Result<State> {
        let output = self.run(dir, &["show", "-json", "-no-color"])?;
        State::from_show_json(&output.stdout)
    }

    /// Apply a step's configuration. Returns the resulting state, or `None`
    /// when the step expected (and got) an error.
    fn apply_step(&self, dir: &Path, step: &TestStep) -> Result<Option<State>> {
        self.write_config(dir, &step.config)?;

        // Syntax errors surface at init; they count for ExpectError too.
        let init = self.init_output(dir)?;
        if !init.status.success() {
            let stderr = String::from_utf8_lossy(&init.stderr).trim().to_string();
            return match &step.expect_error {
                Some(pattern) => expect_failure(pattern, false, stderr).map(|()| None),
                None => Err(TfTestError::Terraform {
                    command: "init".to_string(),
                    stderr,
                }),
            };
        }

        let output = self.command(dir, &["apply", "-auto-approve", "-input=false", "-no-color"])?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if let Some(pattern) = &step.expect_error {
            return expect_failure(pattern, output.status.success(), stderr).map(|()| None);
        }

        if !output.status.success() {
            return Err(TfTestError::Terraform {
                command: "apply".to_string(),
                stderr,
            });
        }

        if self.config.check_idempotency {
            let plan = self.command(dir, &["plan", "-detailed-exitcode", "-input=false", "-no-color"])?;
            match plan.status.code() {
                Some(0) => {}
                Some(2) => {
                    return Err(TfTestError::NonEmptyPlan {
                        path: step.source.clone(),
                    })
                }
                _ => {
                    return Err(TfTestError::Terraform {
                        command: "plan".to_string(),
                        stderr: String::from_utf8_lossy(&plan.stderr).trim().to_string(),
                    })
                }
            }
        }

        let state = self.show(dir)?;
        if let Some(check) = &step.check {
            check.run(&state)?;
        }
        Ok(Some(state))
    }

    /// Import the step's resource into a scratch directory and compare it
    /// with the applied state.
    fn import_step(&self, step: &TestStep, applied: Option<&State>) -> Result<()> {
        let name = step.resource_name.clone().unwrap_or_default();
        let applied = applied.ok_or_else(|| TfTestError::ImportWithoutState(name.clone()))?;
        let expected = applied.primary(&name)?;

        let scratch = TempDir::new()?;
        self.write_config(scratch.path(), &step.config)?;
        self.init(scratch.path())?;
        self.run(
            scratch.path(),
            &["import", "-input=false", "-no-color", name.as_str(), expected.id.as_str()],
        )?;

        if !(step.import_state_verify && self.config.verify_import) {
            return Ok(());
        }

        let imported = self.show(scratch.path())?;
        let actual = imported.primary(&name)?;
        let diffs = attribute_diffs(&expected.attributes, &actual.attributes);
        if diffs.is_empty() {
            Ok(())
        } else {
            Err(TfTestError::ImportVerify { name, diffs })
        }
    }

    fn destroy(&self, dir: &Path) {
        match self.command(dir, &["destroy", "-auto-approve", "-input=false", "-no-color"]) {
            Ok(output) if output.status.success() => debug!("destroyed resources in {}", dir.display()),
            Ok(output) => warn!(
                "terraform destroy failed in {}: {}",
                dir.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => warn!("terraform destroy could not run: {}", e),
        }
    }
}

impl CaseExecutor for TerraformExecutor {
    fn execute(&mut self, case: &TestCase) -> Result<()> {
        let workdir = TempDir::new()?;
        info!(case = %case.name(), dir = %workdir.path().display(), "executing test case");

        let mut last_state: Option<State> = None;
        let mut applied = false;
        let mut outcome = Ok(());

        for (i, step) in case.steps.iter().enumerate() {
            debug!("step {} from {}", i + 1, step.source.display());
            let result = if step.import_state {
                self.import_step(step, last_state.as_ref())
            } else {
                applied = true;
                self.apply_step(workdir.path(), step).map(|state| {
                    if state.is_some() {
                        last_state = state;
                    }
                })
            };
            if let Err(e) = result {
                outcome = Err(e);
                break;
            }
        }

        if applied {
            self.destroy(workdir.path());
        }
        outcome
    }
}

/// The command must have failed with stderr matching `pattern`.
fn expect_failure(pattern: &Regex, success: bool, stderr: String) -> Result<()> {
    if success {
        return Err(TfTestError::ExpectedErrorNotRaised {
            pattern: pattern.as_str().to_string(),
        });
    }
    if !pattern.is_match(&stderr) {
        return Err(TfTestError::ExpectedErrorMismatch {
            pattern: pattern.as_str().to_string(),
            stderr,
        });
    }
    debug!("failed as expected: {}", pattern.as_str());
    Ok(())
}

/// Keys whose values differ between two attribute maps, ignoring counts of
/// the whole object, the id and timeouts.
fn attribute_diffs(
    expected: &BTreeMap<String, String>,
    actual: &BTreeMap<String, String>,
) -> Vec<String> {
    let skip = |key: &str| key == "%" || key == "id" || key == "timeouts" || key.starts_with("timeouts.");
    let mut keys: Vec<&String> = expected.keys().chain(actual.keys()).collect();
    keys.sort();
    keys.dedup();
    keys.into_iter()
        .filter(|key| !skip(key))
        .filter(|key| expected.get(*key) != actual.get(*key))
        .map(|key| {
            format!(
                "{key}: {:?} != {:?}",
                expected.get(key).map(String::as_str).unwrap_or_default(),
                actual.get(key).map(String::as_str).unwrap_or_default()
            )
        })
        .collect()
}
