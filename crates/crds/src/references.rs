//! Object references shared by the CloudNativePG CRDs

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name-only reference to an object in the same namespace
///
/// Mirrors the Kubernetes `LocalObjectReference`, which CloudNativePG uses for
/// `Backup.spec.cluster` and secret references.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocalObjectReference {
    /// Name of the referenced object
    pub name: String,
}

impl LocalObjectReference {
    /// Create a reference to `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
