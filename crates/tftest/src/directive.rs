//! Test directives embedded in fragment comments
//!
//! ```text
//! # ExpectError: <regex>      at most one, the apply must fail with a matching error
//! # Check: <resource>         any number, compare the resource against the snapshot
//! # Import: <resource>        at most one, add an import step for the resource
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TfTestError};
use crate::lexer::Comment;

static EXPECT_ERROR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*ExpectError:\s+(.*)").expect("valid ExpectError pattern"));
static CHECK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*Check:\s+(.*)").expect("valid Check pattern"));
static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*Import:\s+(.*)").expect("valid Import pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectiveKind {
    ExpectError,
    Check,
    Import,
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DirectiveKind::ExpectError => "ExpectError",
            DirectiveKind::Check => "Check",
            DirectiveKind::Import => "Import",
        };
        f.write_str(name)
    }
}

/// Directives found in one fragment
#[derive(Debug, Clone, Default)]
pub struct DirectiveSet {
    pub expect_error: Option<Regex>,
    pub checks: BTreeSet<String>,
    pub import: Option<String>,
}

impl DirectiveSet {
    /// Build the directive set from a fragment's comment tokens.
    pub fn extract(comments: &[Comment], path: &Path) -> Result<Self> {
        let mut set = DirectiveSet::default();

        for comment in comments {
            if let Some(value) = capture(&EXPECT_ERROR_RE, comment, DirectiveKind::ExpectError, path)? {
                if set.expect_error.is_some() {
                    return Err(duplicate(path, DirectiveKind::ExpectError));
                }
                let re = Regex::new(value).map_err(|source| TfTestError::InvalidPattern {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(path = %path.display(), line = comment.line, pattern = value, "ExpectError directive");
                set.expect_error = Some(re);
            }

            if let Some(value) = capture(&IMPORT_RE, comment, DirectiveKind::Import, path)? {
                if set.import.is_some() {
                    return Err(duplicate(path, DirectiveKind::Import));
                }
                debug!(path = %path.display(), line = comment.line, resource = value, "Import directive");
                set.import = Some(value.to_string());
            }

            if let Some(value) = capture(&CHECK_RE, comment, DirectiveKind::Check, path)? {
                debug!(path = %path.display(), line = comment.line, resource = value, "Check directive");
                set.checks.insert(value.to_string());
            }
        }

        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.expect_error.is_none() && self.checks.is_empty() && self.import.is_none()
    }
}

fn capture<'c>(
    re: &Regex,
    comment: &'c Comment,
    kind: DirectiveKind,
    path: &Path,
) -> Result<Option<&'c str>> {
    let Some(caps) = re.captures(&comment.text) else {
        return Ok(None);
    };
    let value = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
    if value.is_empty() {
        return Err(TfTestError::EmptyDirective {
            path: path.to_path_buf(),
            kind,
        });
    }
    Ok(Some(value))
}

fn duplicate(path: &Path, kind: DirectiveKind) -> TfTestError {
    TfTestError::DuplicateDirective {
        path: path.to_path_buf(),
        kind,
    }
}
