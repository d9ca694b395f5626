//! Backup CRD
//!
//! An on-demand CloudNativePG backup (`postgresql.cnpg.io/v1`).

use crate::references::LocalObjectReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Backup phase while the base backup is being taken.
pub const BACKUP_PHASE_RUNNING: &str = "running";
/// Backup phase after a successful backup.
pub const BACKUP_PHASE_COMPLETED: &str = "completed";
/// Backup phase after a failed backup.
pub const BACKUP_PHASE_FAILED: &str = "failed";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "postgresql.cnpg.io",
    version = "v1",
    kind = "Backup",
    namespaced,
    status = "BackupStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct BackupSpec {
    /// Cluster to back up
    pub cluster: LocalObjectReference,

    /// Backup method (barmanObjectStore, volumeSnapshot, plugin)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Preferred instance to take the backup from (primary, prefer-standby)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatus {
    /// Backup phase (new, started, running, completed, failed, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Identifier assigned by the backup tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_id: Option<String>,

    /// Error message if the backup failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the backup started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,

    /// When the backup stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl BackupStatus {
    /// `Some(true)` once completed, `Some(false)` once failed, `None` while in flight
    pub fn completed(&self) -> Option<bool> {
        match self.phase.as_deref() {
            Some(BACKUP_PHASE_COMPLETED) => Some(true),
            Some(BACKUP_PHASE_FAILED) => Some(false),
            _ => None,
        }
    }
}
