//! Environment configuration
//!
//! Everything is read through a lookup function so parsing can be tested
//! without touching the process environment.

use crate::error::ControllerError;
use phase_watcher::PollPolicy;
use std::time::Duration;

/// What to wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitKind {
    /// `postgresql.cnpg.io/v1` Cluster until healthy
    Cluster,
    /// `postgresql.cnpg.io/v1` Backup until completed or failed
    Backup,
    /// `batch/v1` Job until a pod succeeded or the job failed
    Job,
    /// Any namespaced resource, judged by one status field
    Custom {
        group: String,
        version: String,
        plural: String,
        field: String,
        success: Vec<String>,
        failure: Vec<String>,
    },
}

/// Wait configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WaitConfig {
    pub namespace: String,
    pub name: String,
    pub kind: WaitKind,
    pub policy: PollPolicy,
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ControllerError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ControllerError::InvalidConfig(format!("{} environment variable is required", key)))
}

fn number<F>(lookup: &F, key: &str) -> Result<Option<u64>, ControllerError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|value| value.trim().to_string()) {
        None => Ok(None),
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ControllerError::InvalidConfig(format!("{} must be a non-negative integer, got {:?}", key, value))),
    }
}

fn list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl WaitConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let namespace = required(&lookup, "TEST_NAMESPACE")?;
        let name = required(&lookup, "WAIT_NAME")?;

        let kind = match required(&lookup, "WAIT_KIND")?.to_lowercase().as_str() {
            "cluster" => WaitKind::Cluster,
            "backup" => WaitKind::Backup,
            "job" => WaitKind::Job,
            "custom" => {
                let success = list(lookup("WAIT_SUCCESS"));
                if success.is_empty() {
                    return Err(ControllerError::InvalidConfig(
                        "WAIT_SUCCESS must list at least one value".to_string(),
                    ));
                }
                WaitKind::Custom {
                    group: lookup("WAIT_GROUP").map(|g| g.trim().to_string()).unwrap_or_default(),
                    version: required(&lookup, "WAIT_VERSION")?,
                    plural: required(&lookup, "WAIT_PLURAL")?,
                    field: lookup("WAIT_FIELD")
                        .map(|f| f.trim().to_string())
                        .filter(|f| !f.is_empty())
                        .unwrap_or_else(|| "status.phase".to_string()),
                    success,
                    failure: list(lookup("WAIT_FAILURE")),
                }
            }
            other => {
                return Err(ControllerError::InvalidConfig(format!(
                    "WAIT_KIND must be one of cluster, backup, job, custom; got {:?}",
                    other
                )));
            }
        };

        let interval = number(&lookup, "POLL_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(PollPolicy::DEFAULT_INTERVAL);
        let max_polls = match number(&lookup, "MAX_POLLS")? {
            Some(n) => u32::try_from(n)
                .map_err(|_| ControllerError::InvalidConfig(format!("MAX_POLLS is too large: {}", n)))?,
            None => PollPolicy::DEFAULT_MAX_POLLS,
        };
        let mut policy = PollPolicy::new(interval, max_polls)?;
        if let Some(secs) = number(&lookup, "MAX_WAIT_SECS")? {
            policy = policy.with_max_elapsed(Duration::from_secs(secs))?;
        }

        Ok(Self {
            namespace,
            name,
            kind,
            policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phase_watcher::PolicyError;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<WaitConfig, ControllerError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        WaitConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_cluster_defaults() {
        let config = config(&[
            ("TEST_NAMESPACE", "pg-test"),
            ("WAIT_KIND", "cluster"),
            ("WAIT_NAME", "cluster-example"),
        ])
        .unwrap();
        assert_eq!(config.namespace, "pg-test");
        assert_eq!(config.name, "cluster-example");
        assert_eq!(config.kind, WaitKind::Cluster);
        assert_eq!(config.policy, PollPolicy::default());
    }

    #[test]
    fn test_missing_namespace() {
        let err = config(&[("WAIT_KIND", "cluster"), ("WAIT_NAME", "cluster-example")]).unwrap_err();
        assert!(err.to_string().contains("TEST_NAMESPACE"));
    }

    #[test]
    fn test_unknown_kind() {
        let err = config(&[
            ("TEST_NAMESPACE", "pg-test"),
            ("WAIT_KIND", "pooler"),
            ("WAIT_NAME", "pooler-rw"),
        ])
        .unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));
    }

    #[test]
    fn test_poll_budget() {
        let config = config(&[
            ("TEST_NAMESPACE", "pg-test"),
            ("WAIT_KIND", "Backup"),
            ("WAIT_NAME", "automatic-test-backup"),
            ("POLL_INTERVAL_SECS", "2"),
            ("MAX_POLLS", "30"),
            ("MAX_WAIT_SECS", "45"),
        ])
        .unwrap();
        assert_eq!(config.kind, WaitKind::Backup);
        assert_eq!(config.policy.interval(), Duration::from_secs(2));
        assert_eq!(config.policy.max_polls(), 30);
        assert_eq!(config.policy.max_elapsed(), Some(Duration::from_secs(45)));
    }

    #[test]
    fn test_zero_values_rejected() {
        let with = |key: &'static str, value: &'static str| {
            let mut vars = vec![
                ("TEST_NAMESPACE", "pg-test"),
                ("WAIT_KIND", "job"),
                ("WAIT_NAME", "j-runtprocc"),
            ];
            vars.push((key, value));
            config(&vars)
        };

        let err = with("MAX_POLLS", "0").unwrap_err();
        assert!(matches!(err, ControllerError::Policy(PolicyError::ZeroPolls)));

        let err = with("POLL_INTERVAL_SECS", "0").unwrap_err();
        assert!(matches!(err, ControllerError::Policy(PolicyError::ZeroInterval)));

        let err = with("MAX_POLLS", "many").unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));
    }

    #[test]
    fn test_custom_kind() {
        let config = config(&[
            ("TEST_NAMESPACE", "pg-test"),
            ("WAIT_KIND", "custom"),
            ("WAIT_NAME", "scheduled-backup"),
            ("WAIT_GROUP", "postgresql.cnpg.io"),
            ("WAIT_VERSION", "v1"),
            ("WAIT_PLURAL", "scheduledbackups"),
            ("WAIT_FIELD", "status.lastScheduleTime"),
            ("WAIT_SUCCESS", "done, ok"),
            ("WAIT_FAILURE", "failed,,error"),
        ])
        .unwrap();
        assert_eq!(
            config.kind,
            WaitKind::Custom {
                group: "postgresql.cnpg.io".to_string(),
                version: "v1".to_string(),
                plural: "scheduledbackups".to_string(),
                field: "status.lastScheduleTime".to_string(),
                success: vec!["done".to_string(), "ok".to_string()],
                failure: vec!["failed".to_string(), "error".to_string()],
            }
        );
    }

    #[test]
    fn test_custom_kind_needs_success_values() {
        let err = config(&[
            ("TEST_NAMESPACE", "pg-test"),
            ("WAIT_KIND", "custom"),
            ("WAIT_NAME", "x"),
            ("WAIT_VERSION", "v1"),
            ("WAIT_PLURAL", "things"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("WAIT_SUCCESS"));
    }
}
