//! Loader options and runner configuration

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TfTestError};
use crate::ignore::{default_ignore, IgnoreChange};

/// Any non-empty value switches the loader into refresh mode.
pub const REFRESH_STATE_ENV: &str = "TFTEST_REFRESH_STATE";

/// Fragment extension used when none is configured.
pub const DEFAULT_EXTENSION: &str = "tf";

/// Controls how fragments are turned into steps.
#[derive(Clone)]
pub struct TestOptions {
    /// Rewrite snapshots from live state instead of asserting against them.
    pub refresh: bool,

    /// Attribute values flagged here are only asserted as set. `None`
    /// disables the check; the `<set>` sentinel still applies.
    pub ignore_change: Option<IgnoreChange>,

    /// Extension of configuration fragments, without the dot.
    pub extension: String,
}

impl TestOptions {
    /// Default options with refresh mode taken from the environment.
    pub fn from_env() -> Self {
        let refresh = std::env::var_os(REFRESH_STATE_ENV).is_some_and(|v| !v.is_empty());
        Self {
            refresh,
            ..Self::assert_mode()
        }
    }

    /// Default options that always assert against snapshots.
    pub fn assert_mode() -> Self {
        Self {
            refresh: false,
            ignore_change: Some(default_ignore()),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_ignore_change(mut self, ignore: Option<IgnoreChange>) -> Self {
        self.ignore_change = ignore;
        self
    }
}

impl Default for TestOptions {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for TestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestOptions")
            .field("refresh", &self.refresh)
            .field("ignore_change", &self.ignore_change.is_some())
            .field("extension", &self.extension)
            .finish()
    }
}

/// Runner configuration, usually read from `tftest.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Root directory holding fixture directories
    pub fixtures_dir: PathBuf,

    /// Where `test-results.json` is written
    pub output_dir: PathBuf,

    /// Fragment extension
    pub extension: String,

    /// Terraform executor settings
    pub terraform: TerraformConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fixtures_dir: PathBuf::from("tests/fixtures"),
            output_dir: PathBuf::from("test-results"),
            extension: DEFAULT_EXTENSION.to_string(),
            terraform: TerraformConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    /// Terraform binary, looked up in `PATH` when relative
    pub binary: PathBuf,

    /// Run `plan -detailed-exitcode` after every successful apply
    pub check_idempotency: bool,

    /// Compare imported attributes with the applied ones
    pub verify_import: bool,

    /// Extra environment for every terraform invocation
    pub env: BTreeMap<String, String>,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("terraform"),
            check_idempotency: true,
            verify_import: true,
            env: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from file, falling back to defaults when absent.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|err| TfTestError::read(path, err))?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| TfTestError::write(parent, err))?;
        }
        std::fs::write(path, content).map_err(|err| TfTestError::write(path, err))?;
        Ok(())
    }

    /// Loader options for this configuration, refresh taken from the environment.
    pub fn test_options(&self) -> TestOptions {
        TestOptions {
            extension: self.extension.clone(),
            ..TestOptions::from_env()
        }
    }
}
