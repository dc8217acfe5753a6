//! Live Terraform state in flatmap form
//!
//! Attributes are flattened to `key -> string` pairs the way Terraform's
//! legacy state does it: nested objects use `parent.child`, collections carry
//! a count under `parent.#` (lists/sets) or `parent.%` (maps/objects).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TfTestError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub root_module: ModuleState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    pub path: Vec<String>,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for ModuleState {
    fn default() -> Self {
        Self {
            path: vec!["root".to_string()],
            resources: BTreeMap::new(),
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("."))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub primary: Option<InstanceState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl State {
    /// Look up a resource's primary instance in the root module.
    pub fn primary(&self, name: &str) -> Result<&InstanceState> {
        let module = &self.root_module;
        let resource = module
            .resources
            .get(name)
            .ok_or_else(|| TfTestError::ResourceNotFound {
                name: name.to_string(),
                module: module.to_string(),
            })?;
        resource
            .primary
            .as_ref()
            .ok_or_else(|| TfTestError::NoPrimaryInstance {
                name: name.to_string(),
                module: module.to_string(),
            })
    }

    /// Insert a resource with the given attributes. Mostly useful in tests.
    pub fn with_resource<I, K, V>(mut self, name: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let attributes: BTreeMap<String, String> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let id = attributes.get("id").cloned().unwrap_or_default();
        let resource_type = name
            .trim_start_matches("data.")
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();
        self.root_module.resources.insert(
            name.to_string(),
            ResourceState {
                resource_type,
                primary: Some(InstanceState { id, attributes }),
            },
        );
        self
    }

    /// Convert the output of `terraform show -json` into flatmap state.
    /// Only root module resources are kept.
    pub fn from_show_json(data: &[u8]) -> Result<Self> {
        let doc: Value = serde_json::from_slice(data)?;
        let mut state = State::default();

        let resources = doc
            .pointer("/values/root_module/resources")
            .and_then(Value::as_array);
        for resource in resources.into_iter().flatten() {
            let Some(address) = resource.get("address").and_then(Value::as_str) else {
                continue;
            };
            let mut attributes = BTreeMap::new();
            if let Some(Value::Object(values)) = resource.get("values") {
                for (key, value) in values {
                    flatten(key, value, &mut attributes);
                }
            }
            let id = attributes.get("id").cloned().unwrap_or_default();
            let resource_type = resource
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            state.root_module.resources.insert(
                address.to_string(),
                ResourceState {
                    resource_type,
                    primary: Some(InstanceState { id, attributes }),
                },
            );
        }

        Ok(state)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Array(items) => {
            out.insert(format!("{prefix}.#"), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                flatten(&format!("{prefix}.{i}"), item, out);
            }
        }
        Value::Object(map) => {
            let present = map.values().filter(|v| !v.is_null()).count();
            out.insert(format!("{prefix}.%"), present.to_string());
            for (key, item) in map {
                flatten(&format!("{prefix}.{key}"), item, out);
            }
        }
    }
}
