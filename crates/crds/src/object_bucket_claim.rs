//! ObjectBucketClaim CRD
//!
//! An S3 bucket request served by the OpenShift/Rook object bucket provisioner
//! (`objectbucket.io/v1alpha1`). Used as the barman object store for backups.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "objectbucket.io",
    version = "v1alpha1",
    kind = "ObjectBucketClaim",
    namespaced,
    status = "ObjectBucketClaimStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBucketClaimSpec {
    /// Fixed bucket name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,

    /// Prefix for a generated bucket name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_bucket_name: Option<String>,

    /// Storage class backing the bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,

    /// Provisioner specific options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_config: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBucketClaimStatus {
    /// Claim phase (Pending, Bound, Released, Failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}
