//! Kubernetes resource client
//!
//! Implements `ResourceClient` on top of `kube::Api<DynamicObject>`, so any
//! group/version/plural can be addressed without a compiled-in type.

use crate::client_trait::{Deletion, ResourceClient};
use crate::error::ResourceClientError;
use crate::reference::ResourceRef;
use crate::status::StructuredStatus;
use kube::api::{Api, DeleteParams, DynamicObject, Patch, PatchParams, PostParams};
use kube::Client;
use tracing::debug;

/// `ResourceClient` backed by a live cluster
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl std::fmt::Debug for KubeResourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeResourceClient").finish_non_exhaustive()
    }
}

impl KubeResourceClient {
    /// Wrap an existing kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using in-cluster configuration, falling back to the local kubeconfig
    pub async fn try_default() -> Result<Self, ResourceClientError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ResourceClientError::Transport(format!("failed to build Kubernetes client: {}", e)))?;
        Ok(Self { client })
    }

    /// Underlying kube client, for typed core API calls
    pub fn kube_client(&self) -> &Client {
        &self.client
    }

    fn api(&self, resource: &ResourceRef) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), resource.namespace(), &resource.api_resource())
    }

    fn to_status(object: &DynamicObject) -> Result<StructuredStatus, ResourceClientError> {
        Ok(StructuredStatus::new(serde_json::to_value(object)?))
    }

    /// Build the object to create, pinning name and namespace to the reference
    fn prepare_body(resource: &ResourceRef, body: serde_json::Value) -> Result<DynamicObject, ResourceClientError> {
        if !body.is_object() {
            return Err(ResourceClientError::Malformed(format!(
                "body for {} must be a mapping",
                resource
            )));
        }
        let mut object: DynamicObject = serde_json::from_value(body)?;
        object.metadata.name = Some(resource.name().to_string());
        object.metadata.namespace = Some(resource.namespace().to_string());
        Ok(object)
    }
}

#[async_trait::async_trait]
impl ResourceClient for KubeResourceClient {
    async fn get_status(&self, resource: &ResourceRef) -> Result<StructuredStatus, ResourceClientError> {
        debug!("Fetching {}", resource);
        let object = self.api(resource).get(resource.name()).await?;
        Self::to_status(&object)
    }

    async fn create(&self, resource: &ResourceRef, body: serde_json::Value) -> Result<StructuredStatus, ResourceClientError> {
        debug!("Creating {}", resource);
        let object = Self::prepare_body(resource, body)?;
        let created = self.api(resource).create(&PostParams::default(), &object).await?;
        Self::to_status(&created)
    }

    async fn apply(&self, resource: &ResourceRef, body: serde_json::Value) -> Result<StructuredStatus, ResourceClientError> {
        debug!("Patching {}", resource);
        let patched = self
            .api(resource)
            .patch(resource.name(), &PatchParams::default(), &Patch::Merge(&body))
            .await?;
        Self::to_status(&patched)
    }

    async fn delete(&self, resource: &ResourceRef) -> Result<Deletion, ResourceClientError> {
        debug!("Deleting {}", resource);
        let response = self
            .api(resource)
            .delete(resource.name(), &DeleteParams::foreground())
            .await?;
        match response.left() {
            Some(object) => Ok(Deletion::InProgress(Self::to_status(&object)?)),
            None => Ok(Deletion::Completed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prepare_body_pins_name_and_namespace() {
        let resource = ResourceRef::new("postgresql.cnpg.io", "v1", "backups", "pg-test", "automatic-test-backup");
        let body = json!({
            "apiVersion": "postgresql.cnpg.io/v1",
            "kind": "Backup",
            "metadata": {"name": "something-else", "namespace": "default"},
            "spec": {"cluster": {"name": "cluster-example"}}
        });
        let object = KubeResourceClient::prepare_body(&resource, body).unwrap();
        assert_eq!(object.metadata.name.as_deref(), Some("automatic-test-backup"));
        assert_eq!(object.metadata.namespace.as_deref(), Some("pg-test"));
        assert_eq!(object.types.unwrap().kind, "Backup");
        assert_eq!(object.data["spec"]["cluster"]["name"], "cluster-example");
    }

    #[test]
    fn test_prepare_body_rejects_non_mapping() {
        let resource = ResourceRef::new("batch", "v1", "jobs", "pg-test", "j-runtprocc");
        let err = KubeResourceClient::prepare_body(&resource, json!(["not", "a", "mapping"])).unwrap_err();
        assert!(matches!(err, ResourceClientError::Malformed(_)));
    }
}
