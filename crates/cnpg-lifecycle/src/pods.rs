//! Pod, secret and log inspection through the core API

use crate::error::LifecycleError;
use crds::INSTANCE_ROLE_LABEL;
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::api::{Api, DeleteParams, ListParams, LogParams};
use regex::Regex;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Database the superuser secret grants access to
pub const SUPERUSER_DATABASE: &str = "postgres";

/// Container running PostgreSQL in every instance pod
pub const POSTGRES_CONTAINER: &str = "postgres";

/// Log line written by the instance manager after a WAL segment is archived
pub const WAL_ARCHIVED_MARKER: &str = "Archived WAL file";

/// Connection parameters from a `<cluster>-superuser` secret
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    pub database: String,
    pub user: String,
    pub password: String,
    pub host: String,
}

impl std::fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .finish()
    }
}

/// Name of the secret CloudNativePG creates for the superuser
pub fn superuser_secret_name(cluster: &str) -> String {
    format!("{}-superuser", cluster)
}

/// Label selector matching the primary instance
pub fn primary_selector() -> String {
    format!("{}=primary", INSTANCE_ROLE_LABEL)
}

/// Label selector matching the pods of a job
pub fn job_selector(job: &str) -> String {
    format!("job-name={}", job)
}

/// Read credentials from a superuser secret
pub fn credentials_from_secret(secret: &Secret) -> Result<DatabaseCredentials, LifecycleError> {
    let secret_name = secret.metadata.name.as_deref().unwrap_or("<unnamed>");
    let key = |key: &str| -> Result<String, LifecycleError> {
        let bytes = secret
            .data
            .as_ref()
            .and_then(|data| data.get(key))
            .ok_or_else(|| LifecycleError::Malformed(format!("secret {} has no {} key", secret_name, key)))?;
        String::from_utf8(bytes.0.clone())
            .map_err(|_| LifecycleError::Malformed(format!("secret {} key {} is not UTF-8", secret_name, key)))
    };

    Ok(DatabaseCredentials {
        database: SUPERUSER_DATABASE.to_string(),
        user: key("user")?,
        password: key("password")?,
        host: key("host")?,
    })
}

/// Whether the given node names cover more than one node
pub fn spans_multiple_nodes<S: AsRef<str>>(nodes: &[S]) -> bool {
    nodes.iter().map(AsRef::as_ref).collect::<BTreeSet<&str>>().len() > 1
}

/// Whether an instance log shows a completed WAL archive
pub fn log_shows_wal_archived(logs: &str) -> bool {
    logs.contains(WAL_ARCHIVED_MARKER)
}

/// First `TEST RESULT ...` line of a HammerDB run
pub fn find_result_line(logs: &str) -> Result<Option<String>, LifecycleError> {
    let pattern = Regex::new(r"TEST\sRESULT.+")?;
    Ok(pattern.find(logs).map(|m| m.as_str().trim_end().to_string()))
}

/// Core API access scoped to the test namespace
#[derive(Clone)]
pub struct PodInspector {
    pods: Api<Pod>,
    secrets: Api<Secret>,
    namespace: String,
}

impl PodInspector {
    /// Pod and secret APIs for `namespace`
    pub fn new(client: kube::Client, namespace: &str) -> Self {
        Self {
            pods: Api::namespaced(client.clone(), namespace),
            secrets: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
        }
    }

    async fn first_pod_name(&self, selector: &str) -> Result<String, LifecycleError> {
        let pods = self.pods.list(&ListParams::default().labels(selector)).await?;
        pods.items
            .into_iter()
            .find_map(|pod| pod.metadata.name)
            .ok_or_else(|| LifecycleError::NotFound(format!("no pod matching {} in {}", selector, self.namespace)))
    }

    /// Name of the pod currently labelled as primary
    pub async fn primary_pod(&self) -> Result<String, LifecycleError> {
        let name = self.first_pod_name(&primary_selector()).await?;
        debug!("Primary pod in {} is {}", self.namespace, name);
        Ok(name)
    }

    /// Whether the given instance pods are scheduled on more than one node
    pub async fn instances_on_distinct_nodes<S: AsRef<str>>(&self, instances: &[S]) -> Result<bool, LifecycleError> {
        let mut nodes = Vec::with_capacity(instances.len());
        for instance in instances {
            let instance = instance.as_ref();
            let pod = self.pods.get(instance).await?;
            let node = pod
                .spec
                .and_then(|spec| spec.node_name)
                .ok_or_else(|| LifecycleError::Malformed(format!("pod {} is not scheduled on a node", instance)))?;
            debug!("Instance {} runs on node {}", instance, node);
            nodes.push(node);
        }
        Ok(spans_multiple_nodes(nodes.as_slice()))
    }

    /// Delete an instance pod; the operator recreates it
    pub async fn delete_pod(&self, name: &str) -> Result<(), LifecycleError> {
        info!("Deleting pod {}/{}", self.namespace, name);
        self.pods.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    /// Credentials from the `<cluster>-superuser` secret
    pub async fn superuser_credentials(&self, cluster: &str) -> Result<DatabaseCredentials, LifecycleError> {
        let secret = self.secrets.get(&superuser_secret_name(cluster)).await?;
        credentials_from_secret(&secret)
    }

    /// Full log of one container
    pub async fn container_logs(&self, pod: &str, container: &str) -> Result<String, LifecycleError> {
        let params = LogParams {
            container: Some(container.to_string()),
            ..LogParams::default()
        };
        Ok(self.pods.logs(pod, &params).await?)
    }

    /// Whether the instance has archived at least one WAL file
    pub async fn wal_archived(&self, pod: &str) -> Result<bool, LifecycleError> {
        let logs = self.container_logs(pod, POSTGRES_CONTAINER).await?;
        Ok(log_shows_wal_archived(&logs))
    }

    /// `TEST RESULT` line from the first pod of `job`
    pub async fn job_result_line(&self, job: &str, container: &str) -> Result<Option<String>, LifecycleError> {
        let pod = self.first_pod_name(&job_selector(job)).await?;
        let logs = self.container_logs(&pod, container).await?;
        find_result_line(&logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::ByteString;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn secret(entries: &[(&str, &str)]) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some("cluster-example-superuser".to_string()),
                ..Default::default()
            },
            data: Some(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_selectors() {
        assert_eq!(superuser_secret_name("cluster-example"), "cluster-example-superuser");
        assert_eq!(primary_selector(), "cnpg.io/instanceRole=primary");
        assert_eq!(job_selector("j-runtprocc"), "job-name=j-runtprocc");
    }

    #[test]
    fn test_credentials_from_secret() {
        let creds = credentials_from_secret(&secret(&[
            ("user", "postgres"),
            ("password", "s3cr3t"),
            ("host", "cluster-example-rw"),
        ]))
        .unwrap();
        assert_eq!(creds.database, "postgres");
        assert_eq!(creds.user, "postgres");
        assert_eq!(creds.password, "s3cr3t");
        assert_eq!(creds.host, "cluster-example-rw");
        assert!(!format!("{:?}", creds).contains("s3cr3t"));
    }

    #[test]
    fn test_credentials_missing_key() {
        let err = credentials_from_secret(&secret(&[("user", "postgres")])).unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_spans_multiple_nodes() {
        assert!(spans_multiple_nodes(&["worker-1", "worker-2", "worker-1"]));
        assert!(!spans_multiple_nodes(&["worker-1", "worker-1", "worker-1"]));
        assert!(!spans_multiple_nodes(&["worker-1"]));
        // full names, not a single character of them
        assert!(spans_multiple_nodes(&["worker-10", "worker-11"]));
    }

    #[test]
    fn test_wal_archived_marker() {
        let logs = r#"{"level":"info","msg":"Archived WAL file","walName":"000000010000000000000003"}"#;
        assert!(log_shows_wal_archived(logs));
        assert!(!log_shows_wal_archived(r#"{"level":"info","msg":"starting up"}"#));
    }

    #[test]
    fn test_find_result_line() {
        let logs = "Vuser 1:Rampup complete\nVuser 1:TEST RESULT : System achieved 48213 NOPM from 110642 PostgreSQL TPM\nVuser 1:FINISHED SUCCESS\n";
        assert_eq!(
            find_result_line(logs).unwrap().as_deref(),
            Some("TEST RESULT : System achieved 48213 NOPM from 110642 PostgreSQL TPM")
        );
        assert_eq!(find_result_line("Vuser 1:FINISHED FAILED\n").unwrap(), None);
    }
}
