//! Cluster CRD
//!
//! A CloudNativePG PostgreSQL cluster (`postgresql.cnpg.io/v1`).

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Phase reported once every instance is up and replicating.
pub const CLUSTER_PHASE_HEALTHY: &str = "Cluster in healthy state";

/// Label carried by the pod currently acting as primary.
pub const INSTANCE_ROLE_LABEL: &str = "cnpg.io/instanceRole";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "postgresql.cnpg.io",
    version = "v1",
    kind = "Cluster",
    namespaced,
    status = "ClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Number of PostgreSQL instances
    pub instances: i64,

    /// Container image, usually pinned to a PostgreSQL version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,

    /// Remaining operator fields (storage, bootstrap, backup, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// Human readable phase, e.g. "Setting up primary" or "Cluster in healthy state"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Why the cluster is in its current phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_reason: Option<String>,

    /// Number of instances created so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<i64>,

    /// Number of instances passing readiness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_instances: Option<i64>,

    /// Pod names of every instance
    #[serde(default)]
    pub instance_names: Vec<String>,

    /// Pod name of the current primary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_primary: Option<String>,
}

impl ClusterStatus {
    /// Whether the operator reports the cluster as healthy
    pub fn is_healthy(&self) -> bool {
        self.phase.as_deref() == Some(CLUSTER_PHASE_HEALTHY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;

    #[test]
    fn test_cluster_resource_coordinates() {
        assert_eq!(Cluster::group(&()), "postgresql.cnpg.io");
        assert_eq!(Cluster::version(&()), "v1");
        assert_eq!(Cluster::plural(&()), "clusters");
    }

    #[test]
    fn test_cluster_keeps_unmodelled_spec_fields() {
        let yaml = r#"
apiVersion: postgresql.cnpg.io/v1
kind: Cluster
metadata:
  name: cluster-example
spec:
  instances: 3
  imageName: ghcr.io/cloudnative-pg/postgresql:16.2
  storage:
    size: 1Gi
"#;
        let cluster: Cluster = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cluster.spec.instances, 3);
        assert_eq!(
            cluster.spec.image_name.as_deref(),
            Some("ghcr.io/cloudnative-pg/postgresql:16.2")
        );
        assert!(cluster.spec.extra.contains_key("storage"));
        assert!(cluster.status.is_none());
    }

    #[test]
    fn test_cluster_status_healthy() {
        let status: ClusterStatus = serde_json::from_value(serde_json::json!({
            "phase": "Cluster in healthy state",
            "instanceNames": ["cluster-example-1", "cluster-example-2"],
            "currentPrimary": "cluster-example-1"
        }))
        .unwrap();
        assert!(status.is_healthy());
        assert_eq!(status.instance_names.len(), 2);

        let status = ClusterStatus {
            phase: Some("Setting up primary".to_string()),
            ..Default::default()
        };
        assert!(!status.is_healthy());
    }
}
