//! State assertions attached to test steps

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TfTestError};
use crate::ignore::IgnoreChange;
use crate::snapshot::Snapshot;
use crate::state::State;

/// A single attribute assertion against one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttrCheck {
    /// The attribute must equal `value`.
    Equals {
        resource: String,
        key: String,
        value: String,
    },
    /// The attribute must be present and non-empty.
    Set { resource: String, key: String },
}

impl AttrCheck {
    pub fn equals(resource: &str, key: &str, value: &str) -> Self {
        AttrCheck::Equals {
            resource: resource.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn set(resource: &str, key: &str) -> Self {
        AttrCheck::Set {
            resource: resource.to_string(),
            key: key.to_string(),
        }
    }

    pub fn resource(&self) -> &str {
        match self {
            AttrCheck::Equals { resource, .. } | AttrCheck::Set { resource, .. } => resource,
        }
    }

    pub fn run(&self, state: &State) -> Result<()> {
        match self {
            AttrCheck::Equals {
                resource,
                key,
                value,
            } => {
                let primary = state.primary(resource)?;
                match primary.attributes.get(key) {
                    Some(actual) if actual == value => Ok(()),
                    Some(actual) => Err(TfTestError::AttributeMismatch {
                        name: resource.clone(),
                        key: key.clone(),
                        expected: value.clone(),
                        actual: actual.clone(),
                    }),
                    // An absent collection is the same as an empty one.
                    None if value == "0" && (key.ends_with(".#") || key.ends_with(".%")) => Ok(()),
                    None => Err(TfTestError::AttributeNotFound {
                        name: resource.clone(),
                        key: key.clone(),
                    }),
                }
            }
            AttrCheck::Set { resource, key } => {
                let primary = state.primary(resource)?;
                match primary.attributes.get(key) {
                    Some(actual) if !actual.is_empty() => Ok(()),
                    _ => Err(TfTestError::AttributeNotSet {
                        name: resource.clone(),
                        key: key.clone(),
                    }),
                }
            }
        }
    }
}

impl fmt::Display for AttrCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrCheck::Equals {
                resource,
                key,
                value,
            } => write!(f, "{resource}.{key} == {value:?}"),
            AttrCheck::Set { resource, key } => write!(f, "{resource}.{key} is set"),
        }
    }
}

/// Run every check and report all failures together.
pub fn compose_aggregate(checks: &[AttrCheck], state: &State) -> Result<()> {
    let failures: Vec<TfTestError> = checks
        .iter()
        .filter_map(|check| check.run(state).err())
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(TfTestError::Checks(failures))
    }
}

/// What a step does with the state once its configuration is applied.
#[derive(Clone)]
pub enum StepCheck {
    /// Compare the state against snapshot assertions.
    Assert {
        source: PathBuf,
        checks: Vec<AttrCheck>,
    },
    /// Regenerate the snapshot from the state.
    Refresh {
        snapshot: PathBuf,
        names: BTreeSet<String>,
        ignore: Option<IgnoreChange>,
    },
}

impl StepCheck {
    pub fn run(&self, state: &State) -> Result<()> {
        match self {
            StepCheck::Assert { source, checks } => {
                compose_aggregate(checks, state).map_err(|err| TfTestError::StepCheck {
                    path: source.clone(),
                    source: Box::new(err),
                })
            }
            StepCheck::Refresh {
                snapshot,
                names,
                ignore,
            } => Snapshot::from_state(state, names, ignore.as_ref())?.write(snapshot),
        }
    }
}

impl fmt::Debug for StepCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepCheck::Assert { source, checks } => f
                .debug_struct("Assert")
                .field("source", source)
                .field("checks", checks)
                .finish(),
            StepCheck::Refresh {
                snapshot,
                names,
                ignore,
            } => f
                .debug_struct("Refresh")
                .field("snapshot", snapshot)
                .field("names", names)
                .field("ignore", &ignore.is_some())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> State {
        State::default().with_resource(
            "dummy_resource.test",
            [("id", "abc"), ("name", "first"), ("empty", "")],
        )
    }

    #[test]
    fn test_equals() {
        assert!(AttrCheck::equals("dummy_resource.test", "name", "first")
            .run(&state())
            .is_ok());
        let err = AttrCheck::equals("dummy_resource.test", "name", "second")
            .run(&state())
            .unwrap_err();
        assert!(matches!(err, TfTestError::AttributeMismatch { .. }));
    }

    #[test]
    fn test_equals_missing_attribute() {
        let err = AttrCheck::equals("dummy_resource.test", "nope", "x")
            .run(&state())
            .unwrap_err();
        assert_eq!(err.to_string(), "dummy_resource.test: Attribute 'nope' not found");
    }

    #[test]
    fn test_equals_absent_empty_collection() {
        let s = state();
        assert!(AttrCheck::equals("dummy_resource.test", "tags.%", "0").run(&s).is_ok());
        assert!(AttrCheck::equals("dummy_resource.test", "list.#", "0").run(&s).is_ok());
        assert!(AttrCheck::equals("dummy_resource.test", "list.#", "1").run(&s).is_err());
    }

    #[test]
    fn test_set() {
        let s = state();
        assert!(AttrCheck::set("dummy_resource.test", "id").run(&s).is_ok());
        assert!(AttrCheck::set("dummy_resource.test", "empty").run(&s).is_err());
        assert!(AttrCheck::set("dummy_resource.test", "missing").run(&s).is_err());
    }

    #[test]
    fn test_missing_resource() {
        let err = AttrCheck::set("dummy_resource.other", "id")
            .run(&state())
            .unwrap_err();
        assert!(matches!(err, TfTestError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_aggregate_collects_every_failure() {
        let checks = vec![
            AttrCheck::equals("dummy_resource.test", "name", "first"),
            AttrCheck::equals("dummy_resource.test", "name", "other"),
            AttrCheck::set("dummy_resource.test", "empty"),
        ];
        match compose_aggregate(&checks, &state()).unwrap_err() {
            TfTestError::Checks(failures) => assert_eq!(failures.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_assert_names_the_step() {
        let check = StepCheck::Assert {
            source: PathBuf::from("/fixtures/basic/main.tf"),
            checks: vec![AttrCheck::equals("dummy_resource.test", "name", "other")],
        };
        let message = check.run(&state()).unwrap_err().to_string();
        assert!(message.contains("expected \"other\", got \"first\""));
        assert!(message.contains("/fixtures/basic/main.tf"));
    }
}
