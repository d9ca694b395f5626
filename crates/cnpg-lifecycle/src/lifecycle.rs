//! Lifecycle operations against one test namespace
//!
//! Custom resources and jobs go through a [`ResourceClient`]; pods, secrets and
//! logs need a real `kube::Client` and fail with `MissingKubeClient` without one.

use crate::error::LifecycleError;
use crate::manifest::manifest_name;
use crate::pods::{DatabaseCredentials, PodInspector};
use crate::predicates::{backup_finished, cluster_healthy, JobFinished};
use crds::{Backup, BackupStatus, Cluster, ClusterStatus, ObjectBucketClaim};
use k8s_openapi::api::batch::v1::Job;
use kube::Resource;
use phase_watcher::{watch, CancellationToken, PhasePredicate, PollPolicy, WatchOutcome};
use resource_client::{Deletion, KubeResourceClient, ResourceClient, ResourceRef};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Entry point for deploying, inspecting and waiting on CloudNativePG resources
#[derive(Clone)]
pub struct Lifecycle {
    client: Arc<dyn ResourceClient>,
    inspector: Option<PodInspector>,
    namespace: String,
    policy: PollPolicy,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("namespace", &self.namespace)
            .field("policy", &self.policy)
            .field("core_api", &self.inspector.is_some())
            .finish()
    }
}

impl Lifecycle {
    /// Lifecycle over an arbitrary resource client, without core API access
    pub fn new(client: Arc<dyn ResourceClient>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            inspector: None,
            namespace: namespace.into(),
            policy: PollPolicy::default(),
        }
    }

    /// Lifecycle backed by the cluster from kubeconfig or the in-cluster environment
    pub async fn try_default(namespace: impl Into<String>) -> Result<Self, LifecycleError> {
        let kube_client = kube::Client::try_default().await?;
        let client: Arc<dyn ResourceClient> = Arc::new(KubeResourceClient::new(kube_client.clone()));
        Ok(Self::new(client, namespace).with_kube_client(kube_client))
    }

    /// Enable pod, secret and log operations
    pub fn with_kube_client(mut self, client: kube::Client) -> Self {
        self.inspector = Some(PodInspector::new(client, &self.namespace));
        self
    }

    /// Poll budget used by every wait
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Namespace every operation targets
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Poll budget used by the waits
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    fn reference<K: Resource<DynamicType = ()>>(&self, name: &str) -> ResourceRef {
        ResourceRef::of::<K>(self.namespace.as_str(), name)
    }

    fn inspector(&self) -> Result<&PodInspector, LifecycleError> {
        self.inspector.as_ref().ok_or(LifecycleError::MissingKubeClient)
    }

    async fn create_from<K: Resource<DynamicType = ()>>(&self, manifest: Value) -> Result<ResourceRef, LifecycleError> {
        let resource = self.reference::<K>(&manifest_name(&manifest)?);
        info!("Creating {}", resource);
        self.client.create(&resource, manifest).await?;
        Ok(resource)
    }

    async fn delete<K: Resource<DynamicType = ()>>(&self, name: &str) -> Result<Deletion, LifecycleError> {
        let resource = self.reference::<K>(name);
        info!("Deleting {}", resource);
        let deletion = self.client.delete(&resource).await?;
        if let Deletion::InProgress(_) = deletion {
            info!("{} is terminating", resource);
        }
        Ok(deletion)
    }

    async fn wait<K, P>(&self, name: &str, predicate: &P, cancel: &CancellationToken) -> WatchOutcome
    where
        K: Resource<DynamicType = ()>,
        P: PhasePredicate,
    {
        self.wait_on(&self.reference::<K>(name), predicate, cancel).await
    }

    /// Wait on any resource with the lifecycle's poll policy
    pub async fn wait_on<P>(&self, resource: &ResourceRef, predicate: &P, cancel: &CancellationToken) -> WatchOutcome
    where
        P: PhasePredicate + ?Sized,
    {
        info!("Waiting on {} (every {:?}, at most {} polls)", resource, self.policy.interval(), self.policy.max_polls());
        let outcome = watch(resource, &self.policy, predicate, self.client.as_ref(), cancel).await;
        if !outcome.is_success() {
            warn!("Wait on {} ended: {}", resource, outcome);
        }
        outcome
    }

    // Clusters

    /// Create a cluster from its manifest
    pub async fn deploy_cluster(&self, manifest: Value) -> Result<ResourceRef, LifecycleError> {
        self.create_from::<Cluster>(manifest).await
    }

    /// Merge `manifest` into the running cluster `name`
    pub async fn apply_cluster(&self, name: &str, manifest: Value) -> Result<(), LifecycleError> {
        let resource = self.reference::<Cluster>(name);
        info!("Applying changes to {}", resource);
        self.client.apply(&resource, manifest).await?;
        Ok(())
    }

    /// Delete a cluster and its instances
    pub async fn delete_cluster(&self, name: &str) -> Result<Deletion, LifecycleError> {
        self.delete::<Cluster>(name).await
    }

    /// Wait until the cluster reports `"Cluster in healthy state"`
    pub async fn wait_until_cluster_healthy(&self, name: &str, cancel: &CancellationToken) -> WatchOutcome {
        self.wait::<Cluster, _>(name, &cluster_healthy(), cancel).await
    }

    /// Pod names of every instance, from `status.instanceNames`
    pub async fn instance_names(&self, name: &str) -> Result<Vec<String>, LifecycleError> {
        let document = self.client.get_status(&self.reference::<Cluster>(name)).await?;
        let status: ClusterStatus = document.decode("status")?;
        Ok(status.instance_names)
    }

    // Backups

    /// Create an on-demand backup from its manifest
    pub async fn run_backup(&self, manifest: Value) -> Result<ResourceRef, LifecycleError> {
        self.create_from::<Backup>(manifest).await
    }

    /// Delete a backup object
    pub async fn delete_backup(&self, name: &str) -> Result<Deletion, LifecycleError> {
        self.delete::<Backup>(name).await
    }

    /// Wait until the backup is `completed` (success) or `failed` (failure)
    pub async fn wait_until_backup_finished(&self, name: &str, cancel: &CancellationToken) -> WatchOutcome {
        self.wait::<Backup, _>(name, &backup_finished(), cancel).await
    }

    /// `Some(true)` once completed, `Some(false)` once failed, `None` while in flight
    pub async fn backup_completed(&self, name: &str) -> Result<Option<bool>, LifecycleError> {
        let document = self.client.get_status(&self.reference::<Backup>(name)).await?;
        let status: BackupStatus = match document.lookup("status") {
            Some(_) => document.decode("status")?,
            None => BackupStatus::default(),
        };
        if let Some(error) = &status.error {
            warn!("Backup {} reported: {}", name, error);
        }
        Ok(status.completed())
    }

    // Object bucket claims

    /// Create an object bucket claim from its manifest
    pub async fn deploy_bucket(&self, manifest: Value) -> Result<ResourceRef, LifecycleError> {
        self.create_from::<ObjectBucketClaim>(manifest).await
    }

    /// Delete an object bucket claim
    pub async fn delete_bucket(&self, name: &str) -> Result<Deletion, LifecycleError> {
        self.delete::<ObjectBucketClaim>(name).await
    }

    // Jobs

    /// Create a job from a single-document manifest
    pub async fn apply_job(&self, manifest: Value) -> Result<ResourceRef, LifecycleError> {
        self.create_from::<Job>(manifest).await
    }

    /// Delete a job together with its pods
    pub async fn delete_job(&self, name: &str) -> Result<Deletion, LifecycleError> {
        self.delete::<Job>(name).await
    }

    /// Wait until a job pod succeeds or the job is marked failed
    pub async fn wait_until_job_finished(&self, name: &str, cancel: &CancellationToken) -> WatchOutcome {
        self.wait::<Job, _>(name, &JobFinished, cancel).await
    }

    // Pods, secrets and logs

    /// Name of the pod labelled as primary
    pub async fn primary_pod(&self) -> Result<String, LifecycleError> {
        self.inspector()?.primary_pod().await
    }

    /// Whether `instances` do not all run on the same node
    pub async fn instances_on_distinct_nodes<S: AsRef<str>>(&self, instances: &[S]) -> Result<bool, LifecycleError> {
        self.inspector()?.instances_on_distinct_nodes(instances).await
    }

    /// Delete an instance pod
    pub async fn delete_pod(&self, name: &str) -> Result<(), LifecycleError> {
        self.inspector()?.delete_pod(name).await
    }

    /// Connection parameters from `<cluster>-superuser`
    pub async fn superuser_credentials(&self, cluster: &str) -> Result<DatabaseCredentials, LifecycleError> {
        self.inspector()?.superuser_credentials(cluster).await
    }

    /// Whether the `postgres` container of `pod` logged an archived WAL file
    pub async fn wal_archived(&self, pod: &str) -> Result<bool, LifecycleError> {
        self.inspector()?.wal_archived(pod).await
    }

    /// `TEST RESULT` line logged by `container` in the first pod of `job`
    pub async fn job_result_line(&self, job: &str, container: &str) -> Result<Option<String>, LifecycleError> {
        self.inspector()?.job_result_line(job, container).await
    }
}
