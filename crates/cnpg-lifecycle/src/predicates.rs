//! Target phases for the resources the lifecycle waits on

use crds::{BACKUP_PHASE_COMPLETED, BACKUP_PHASE_FAILED, CLUSTER_PHASE_HEALTHY};
use phase_watcher::{FieldPredicate, PhasePredicate, Verdict};
use resource_client::{MalformedStatus, StructuredStatus};
use serde_json::Value;

/// Cluster reports `"Cluster in healthy state"`; a cluster has no failure phase
pub fn cluster_healthy() -> FieldPredicate {
    FieldPredicate::equals("status.phase", CLUSTER_PHASE_HEALTHY).pending_when_missing()
}

/// Backup reached `completed` (success) or `failed` (failure)
pub fn backup_finished() -> FieldPredicate {
    FieldPredicate::equals("status.phase", BACKUP_PHASE_COMPLETED)
        .failing_on([BACKUP_PHASE_FAILED])
        .pending_when_missing()
}

/// `batch/v1` Job ran to completion
///
/// At least one succeeded pod is success. A `Failed` condition with status
/// `True` (backoff limit or deadline exceeded) is failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobFinished;

impl PhasePredicate for JobFinished {
    fn evaluate(&self, status: &StructuredStatus) -> Result<Verdict, MalformedStatus> {
        if let Some(succeeded) = status.lookup("status.succeeded") {
            let succeeded = succeeded.as_i64().ok_or_else(|| MalformedStatus::WrongType {
                path: "status.succeeded".to_string(),
                expected: "an integer",
            })?;
            if succeeded >= 1 {
                return Ok(Verdict::Success);
            }
        }

        let conditions = status
            .lookup("status.conditions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let failed = conditions.iter().find(|condition| {
            condition.get("type").and_then(Value::as_str) == Some("Failed")
                && condition.get("status").and_then(Value::as_str) == Some("True")
        });

        Ok(match failed {
            Some(condition) => {
                let reason = condition
                    .get("message")
                    .or_else(|| condition.get("reason"))
                    .and_then(Value::as_str)
                    .unwrap_or("job failed");
                Verdict::Failure(reason.to_string())
            }
            None => Verdict::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(document: Value) -> StructuredStatus {
        StructuredStatus::new(document)
    }

    #[test]
    fn test_cluster_healthy() {
        let healthy = cluster_healthy();
        assert_eq!(healthy.evaluate(&status(json!({}))).unwrap(), Verdict::Pending);
        assert_eq!(
            healthy.evaluate(&status(json!({"status": {"phase": "Setting up primary"}}))).unwrap(),
            Verdict::Pending
        );
        assert_eq!(
            healthy.evaluate(&status(json!({"status": {"phase": "Cluster in healthy state"}}))).unwrap(),
            Verdict::Success
        );
    }

    #[test]
    fn test_backup_finished() {
        let finished = backup_finished();
        assert_eq!(finished.evaluate(&status(json!({"spec": {}}))).unwrap(), Verdict::Pending);
        assert_eq!(
            finished.evaluate(&status(json!({"status": {"phase": "running"}}))).unwrap(),
            Verdict::Pending
        );
        assert_eq!(
            finished.evaluate(&status(json!({"status": {"phase": "completed"}}))).unwrap(),
            Verdict::Success
        );
        assert!(matches!(
            finished.evaluate(&status(json!({"status": {"phase": "failed"}}))).unwrap(),
            Verdict::Failure(_)
        ));
    }

    #[test]
    fn test_job_finished() {
        let verdict = |document: Value| JobFinished.evaluate(&status(document));

        assert_eq!(verdict(json!({"status": {}})).unwrap(), Verdict::Pending);
        assert_eq!(verdict(json!({"status": {"active": 1, "succeeded": 0}})).unwrap(), Verdict::Pending);
        assert_eq!(verdict(json!({"status": {"succeeded": 1}})).unwrap(), Verdict::Success);
        assert_eq!(
            verdict(json!({"status": {"failed": 6, "conditions": [
                {"type": "Failed", "status": "True", "reason": "BackoffLimitExceeded",
                 "message": "Job has reached the specified backoff limit"}
            ]}}))
            .unwrap(),
            Verdict::Failure("Job has reached the specified backoff limit".to_string())
        );
        assert_eq!(
            verdict(json!({"status": {"conditions": [{"type": "Failed", "status": "False"}]}})).unwrap(),
            Verdict::Pending
        );
        assert!(verdict(json!({"status": {"succeeded": "one"}})).is_err());
    }
}
