//! Lifecycle error types.

use resource_client::{MalformedStatus, ResourceClientError};
use thiserror::Error;

/// Errors returned by lifecycle operations.
///
/// Waits never return these for the resource's own state; that ends up in a
/// `WatchOutcome`. These cover manifests, one-shot API calls and inspection.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Custom resource API error
    #[error(transparent)]
    Client(#[from] ResourceClientError),

    /// Core API error (pods, secrets, logs)
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Manifest is not valid YAML
    #[error("Invalid manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Manifest file could not be read or written
    #[error("Manifest I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document lacks a field or has the wrong shape
    #[error("Malformed resource: {0}")]
    Malformed(String),

    /// Expected object is absent (e.g. no pod carries the primary label)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Built-in log or version pattern failed to compile
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// PostgreSQL version string could not be parsed
    #[error("Invalid PostgreSQL version: {0}")]
    InvalidVersion(String),

    /// Operation needs core API access but only a resource client was supplied
    #[error("Operation requires a Kubernetes client")]
    MissingKubeClient,
}

impl From<MalformedStatus> for LifecycleError {
    fn from(error: MalformedStatus) -> Self {
        Self::Malformed(error.to_string())
    }
}
