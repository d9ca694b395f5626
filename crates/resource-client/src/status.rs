//! Structured status documents
//!
//! The client hands back whole resource documents. Predicates read them through
//! dotted field paths (`status.phase`, `status.conditions.0.type`) so that a
//! missing or mistyped field is reported as `MalformedStatus` instead of a panic.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A status document lacked a field or carried the wrong type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedStatus {
    /// Field absent or `null`
    #[error("missing field `{0}`")]
    MissingField(String),

    /// Field present with an unexpected JSON type
    #[error("field `{path}` is not {expected}")]
    WrongType {
        path: String,
        expected: &'static str,
    },

    /// Subtree could not be decoded into the requested type
    #[error("field `{path}` could not be decoded: {message}")]
    Undecodable { path: String, message: String },
}

/// Observed resource document (metadata, spec and status) as a JSON tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredStatus(Value);

impl StructuredStatus {
    /// Wrap a resource document
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// Borrow the raw document
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap the raw document
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Follow a dotted path; numeric segments index into arrays.
    ///
    /// Returns `None` for absent fields and explicit `null`s.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        (!current.is_null()).then_some(current)
    }

    /// Like [`lookup`](Self::lookup) but a missing field is an error
    pub fn field(&self, path: &str) -> Result<&Value, MalformedStatus> {
        self.lookup(path)
            .ok_or_else(|| MalformedStatus::MissingField(path.to_string()))
    }

    /// String at `path`
    pub fn str_field(&self, path: &str) -> Result<&str, MalformedStatus> {
        self.field(path)?.as_str().ok_or_else(|| MalformedStatus::WrongType {
            path: path.to_string(),
            expected: "a string",
        })
    }

    /// Integer at `path`
    pub fn i64_field(&self, path: &str) -> Result<i64, MalformedStatus> {
        self.field(path)?.as_i64().ok_or_else(|| MalformedStatus::WrongType {
            path: path.to_string(),
            expected: "an integer",
        })
    }

    /// Boolean at `path`
    pub fn bool_field(&self, path: &str) -> Result<bool, MalformedStatus> {
        self.field(path)?.as_bool().ok_or_else(|| MalformedStatus::WrongType {
            path: path.to_string(),
            expected: "a boolean",
        })
    }

    /// Array of strings, e.g. `status.instanceNames`
    pub fn string_list(&self, path: &str) -> Result<Vec<String>, MalformedStatus> {
        let wrong_type = || MalformedStatus::WrongType {
            path: path.to_string(),
            expected: "an array of strings",
        };
        self.field(path)?
            .as_array()
            .ok_or_else(wrong_type)?
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(wrong_type))
            .collect()
    }

    /// Decode the subtree at `path` into a typed value (use `""` for the whole document)
    pub fn decode<T: DeserializeOwned>(&self, path: &str) -> Result<T, MalformedStatus> {
        let subtree = if path.is_empty() { &self.0 } else { self.field(path)? };
        T::deserialize(subtree).map_err(|e| MalformedStatus::Undecodable {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// `metadata.name`, when present
    pub fn name(&self) -> Option<&str> {
        self.lookup("metadata.name").and_then(Value::as_str)
    }
}

impl From<Value> for StructuredStatus {
    fn from(document: Value) -> Self {
        Self(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::ClusterStatus;
    use serde_json::json;

    fn cluster_document() -> StructuredStatus {
        StructuredStatus::new(json!({
            "metadata": {"name": "cluster-example"},
            "status": {
                "phase": "Cluster in healthy state",
                "readyInstances": 3,
                "instanceNames": ["cluster-example-1", "cluster-example-2", "cluster-example-3"],
                "conditions": [{"type": "Ready", "status": "True"}],
                "phaseReason": null
            }
        }))
    }

    #[test]
    fn test_nested_lookups() {
        let doc = cluster_document();
        assert_eq!(doc.name(), Some("cluster-example"));
        assert_eq!(doc.str_field("status.phase").unwrap(), "Cluster in healthy state");
        assert_eq!(doc.i64_field("status.readyInstances").unwrap(), 3);
        assert_eq!(doc.str_field("status.conditions.0.type").unwrap(), "Ready");
        assert_eq!(doc.string_list("status.instanceNames").unwrap().len(), 3);
    }

    #[test]
    fn test_missing_and_null_fields_are_malformed() {
        let doc = cluster_document();
        assert_eq!(
            doc.str_field("status.currentPrimary"),
            Err(MalformedStatus::MissingField("status.currentPrimary".to_string()))
        );
        assert!(doc.lookup("status.phaseReason").is_none());
        assert!(doc.lookup("status.conditions.7").is_none());
        assert!(doc.lookup("status.phase.deeper").is_none());
    }

    #[test]
    fn test_wrong_type() {
        let doc = cluster_document();
        let err = doc.str_field("status.readyInstances").unwrap_err();
        assert!(matches!(err, MalformedStatus::WrongType { expected: "a string", .. }));
        assert!(doc.bool_field("status.phase").is_err());
        assert!(doc.string_list("status.conditions").is_err());
    }

    #[test]
    fn test_decode_typed_status() {
        let status: ClusterStatus = cluster_document().decode("status").unwrap();
        assert!(status.is_healthy());
        assert_eq!(status.instance_names[0], "cluster-example-1");

        let err = cluster_document()
            .decode::<Vec<String>>("status.phase")
            .unwrap_err();
        assert!(matches!(err, MalformedStatus::Undecodable { .. }));
    }
}
