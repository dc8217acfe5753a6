//! Saved expected attribute values for post-apply verification

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::check::AttrCheck;
use crate::error::{Result, TfTestError};
use crate::ignore::{is_volatile, IgnoreChange};
use crate::state::State;

/// Stands in for values that must be present but may change between runs.
pub const SET_SENTINEL: &str = "<set>";

/// resource -> attribute -> expected value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(pub BTreeMap<String, BTreeMap<String, String>>);

/// The snapshot sitting next to a fragment: `main.tf` -> `main.json`.
pub fn snapshot_path(fragment: &Path) -> PathBuf {
    fragment.with_extension("json")
}

impl Snapshot {
    /// Read a snapshot. A missing or empty file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot");
                return Ok(None);
            }
            Err(err) => return Err(TfTestError::read(path, err)),
        };
        if data.is_empty() {
            return Ok(None);
        }
        let snapshot = serde_json::from_slice(&data).map_err(|source| TfTestError::SnapshotParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    /// Assertions for the requested resources. Sentinel and volatile values
    /// only need to be set.
    pub fn checks(&self, names: &BTreeSet<String>, ignore: Option<&IgnoreChange>) -> Vec<AttrCheck> {
        let mut checks = Vec::new();
        for (name, attributes) in &self.0 {
            if !names.contains(name) {
                continue;
            }
            for (key, value) in attributes {
                if value == SET_SENTINEL || is_volatile(ignore, name, key, value) {
                    checks.push(AttrCheck::set(name, key));
                } else {
                    checks.push(AttrCheck::equals(name, key, value));
                }
            }
        }
        checks
    }

    /// Capture the named resources from live state.
    pub fn from_state(
        state: &State,
        names: &BTreeSet<String>,
        ignore: Option<&IgnoreChange>,
    ) -> Result<Self> {
        let mut snapshot = BTreeMap::new();
        for name in names {
            let primary = state.primary(name)?;
            let attributes = primary
                .attributes
                .iter()
                .filter(|(key, _)| key.as_str() != "%")
                .map(|(key, value)| {
                    let stored = if is_volatile(ignore, name, key, value) {
                        SET_SENTINEL.to_string()
                    } else {
                        value.clone()
                    };
                    (key.clone(), stored)
                })
                .collect();
            snapshot.insert(name.clone(), attributes);
        }
        Ok(Snapshot(snapshot))
    }

    /// Write as indented JSON with a trailing newline.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json).map_err(|err| TfTestError::write(path, err))?;
        info!(path = %path.display(), resources = self.0.len(), "snapshot refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::default_ignore;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_snapshot_path() {
        assert_eq!(
            snapshot_path(Path::new("fixtures/basic/01-create.tf")),
            PathBuf::from("fixtures/basic/01-create.json")
        );
    }

    #[test]
    fn test_load_missing_and_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.json");
        assert!(Snapshot::load(&path).unwrap().is_none());

        std::fs::write(&path, "").unwrap();
        assert!(Snapshot::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.json");
        std::fs::write(&path, r#"{"a.b": {"k": 1}}"#).unwrap();
        let err = Snapshot::load(&path).unwrap_err();
        assert!(matches!(err, TfTestError::SnapshotParse { .. }));
    }

    #[test]
    fn test_checks_only_for_named_resources() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{
              "a.one": {"id": "<set>", "name": "x"},
              "a.two": {"name": "y"}
            }"#,
        )
        .unwrap();
        let checks = snapshot.checks(&names(&["a.one"]), None);
        assert_eq!(
            checks,
            vec![AttrCheck::set("a.one", "id"), AttrCheck::equals("a.one", "name", "x")]
        );
    }

    #[test]
    fn test_checks_use_ignore_predicate() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"a.one": {"created_at": "2024-01-01T00:00:00Z"}}"#,
        )
        .unwrap();
        let ignore = default_ignore();
        let checks = snapshot.checks(&names(&["a.one"]), Some(&ignore));
        assert_eq!(checks, vec![AttrCheck::set("a.one", "created_at")]);
    }

    #[test]
    fn test_from_state_skips_count_and_masks_volatile() {
        let state = State::default().with_resource(
            "a.one",
            [
                ("%", "3"),
                ("id", "6ba7b810-9dad-11d1-80b4-00c04fd430c8"),
                ("name", "x"),
            ],
        );
        let ignore = default_ignore();
        let snapshot = Snapshot::from_state(&state, &names(&["a.one"]), Some(&ignore)).unwrap();
        let attrs = &snapshot.0["a.one"];
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["id"], SET_SENTINEL);
        assert_eq!(attrs["name"], "x");
    }

    #[test]
    fn test_from_state_missing_resource() {
        let err = Snapshot::from_state(&State::default(), &names(&["a.one"]), None).unwrap_err();
        assert_eq!(err.to_string(), "Not found: a.one in root");
    }

    #[test]
    fn test_write_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.json");
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"b.two": {"z": "1", "a": "<set>"}, "a.one": {}}"#).unwrap();
        snapshot.write(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n  \"a.one\": {},\n  \"b.two\": {\n    \"a\": \"<set>\",\n    \"z\": \"1\"\n  }\n}\n"
        );
    }
}
