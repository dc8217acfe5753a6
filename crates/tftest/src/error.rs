//! Error types for fixture loading and step execution

use std::path::PathBuf;
use thiserror::Error;

use crate::directive::DirectiveKind;

#[derive(Error, Debug)]
pub enum TfTestError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk fixture directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("{}:{line}: {message}", path.display())]
    Lex {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}: invalid ExpectError pattern: {source}", path.display())]
    InvalidPattern {
        path: PathBuf,
        #[source]
        source: regex::Error,
    },

    #[error("{}: multiple {kind} statements have been found", path.display())]
    DuplicateDirective { path: PathBuf, kind: DirectiveKind },

    #[error("{}: {kind} statement has no value", path.display())]
    EmptyDirective { path: PathBuf, kind: DirectiveKind },

    #[error(
        "{}: neither Check, ExpectError nor Import statements have been found in Terraform configuration",
        path.display()
    )]
    NoDirectives { path: PathBuf },

    #[error("failed to parse snapshot {}: {source}", path.display())]
    SnapshotParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load step: {0}")]
    LoadStep(#[source] Box<TfTestError>),

    #[error("Not found: {name} in {module}")]
    ResourceNotFound { name: String, module: String },

    #[error("No primary instance: {name} in {module}")]
    NoPrimaryInstance { name: String, module: String },

    #[error("{name}: Attribute '{key}' not found")]
    AttributeNotFound { name: String, key: String },

    #[error("{name}: Attribute '{key}' expected {expected:?}, got {actual:?}")]
    AttributeMismatch {
        name: String,
        key: String,
        expected: String,
        actual: String,
    },

    #[error("{name}: Attribute '{key}' expected to be set")]
    AttributeNotSet { name: String, key: String },

    #[error("{}", join_errors(.0))]
    Checks(Vec<TfTestError>),

    #[error("{source}\nAn error occurred while running test step {}\n", path.display())]
    StepCheck {
        path: PathBuf,
        #[source]
        source: Box<TfTestError>,
    },

    #[error("terraform {command} failed: {stderr}")]
    Terraform { command: String, stderr: String },

    #[error("terraform binary not found: {0}")]
    TerraformNotFound(String),

    #[error("expected an error matching {pattern:?} but the apply succeeded")]
    ExpectedErrorNotRaised { pattern: String },

    #[error("expected an error matching {pattern:?}, got: {stderr}")]
    ExpectedErrorMismatch { pattern: String, stderr: String },

    #[error("plan is not empty after apply of {}", path.display())]
    NonEmptyPlan { path: PathBuf },

    #[error("import of {name} produced different attributes: {}", diffs.join(", "))]
    ImportVerify { name: String, diffs: Vec<String> },

    #[error("import step for {0} has no preceding state")]
    ImportWithoutState(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_errors(errors: &[TfTestError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl TfTestError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TfTestError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TfTestError::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TfTestError>;
