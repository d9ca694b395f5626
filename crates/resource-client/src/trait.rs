//! ResourceClient trait for mocking
//!
//! This trait abstracts the Kubernetes API so the watcher and lifecycle code
//! can be unit tested against `MockResourceClient`.
//! All async methods must be `Send` to work with Tokio's work-stealing runtime.

use crate::error::ResourceClientError;
use crate::reference::ResourceRef;
use crate::status::StructuredStatus;

/// Result of a delete request
#[derive(Debug, Clone, PartialEq)]
pub enum Deletion {
    /// Object still exists with a deletion timestamp (finalizers or foreground children pending)
    InProgress(StructuredStatus),
    /// Object is gone
    Completed,
}

/// Operations on a single namespaced resource
#[async_trait::async_trait]
pub trait ResourceClient: Send + Sync {
    /// Read the current document of the resource
    async fn get_status(&self, resource: &ResourceRef) -> Result<StructuredStatus, ResourceClientError>;

    /// Create the resource from `body`; name and namespace are taken from `resource`
    async fn create(&self, resource: &ResourceRef, body: serde_json::Value) -> Result<StructuredStatus, ResourceClientError>;

    /// Merge `body` into the existing resource
    async fn apply(&self, resource: &ResourceRef, body: serde_json::Value) -> Result<StructuredStatus, ResourceClientError>;

    /// Delete the resource (foreground propagation)
    async fn delete(&self, resource: &ResourceRef) -> Result<Deletion, ResourceClientError>;
}
