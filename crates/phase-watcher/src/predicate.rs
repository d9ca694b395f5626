//! Phase predicates
//!
//! A predicate maps an observed status document to a [`Verdict`]. Predicates
//! must be pure: the watcher may evaluate the same document more than once.

use resource_client::{MalformedStatus, StructuredStatus};
use serde_json::Value;

/// What a single observation means for the watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Not there yet, poll again
    Pending,
    /// Target reached
    Success,
    /// Terminal failure with a human readable reason; never retried
    Failure(String),
}

/// Maps an observed status to a verdict
///
/// Implemented for plain closures:
///
/// ```
/// use phase_watcher::{PhasePredicate, Verdict};
/// use resource_client::{MalformedStatus, StructuredStatus};
///
/// let succeeded = |status: &StructuredStatus| -> Result<Verdict, MalformedStatus> {
///     Ok(match status.lookup("status.succeeded").and_then(|v| v.as_i64()) {
///         Some(n) if n > 0 => Verdict::Success,
///         _ => Verdict::Pending,
///     })
/// };
/// let doc = StructuredStatus::new(serde_json::json!({"status": {"succeeded": 1}}));
/// assert_eq!(succeeded.evaluate(&doc), Ok(Verdict::Success));
/// ```
pub trait PhasePredicate: Send + Sync {
    fn evaluate(&self, status: &StructuredStatus) -> Result<Verdict, MalformedStatus>;
}

impl<F> PhasePredicate for F
where
    F: Fn(&StructuredStatus) -> Result<Verdict, MalformedStatus> + Send + Sync,
{
    fn evaluate(&self, status: &StructuredStatus) -> Result<Verdict, MalformedStatus> {
        self(status)
    }
}

/// How a [`FieldPredicate`] treats an absent field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingField {
    /// Absent field is a malformed status (fatal)
    #[default]
    Malformed,
    /// Absent field means the operator has not reported yet
    Pending,
}

/// Compares a scalar field against success and failure value sets
///
/// Values not in either set are `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPredicate {
    path: String,
    success: Vec<String>,
    failure: Vec<String>,
    missing: MissingField,
}

impl FieldPredicate {
    /// Success once `path` equals `value`
    pub fn equals(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::one_of(path, [value])
    }

    /// Success once `path` equals any of `values`
    pub fn one_of<I, S>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            success: values.into_iter().map(Into::into).collect(),
            failure: Vec::new(),
            missing: MissingField::Malformed,
        }
    }

    /// Terminal failure once `path` equals any of `values`
    #[must_use]
    pub fn failing_on<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure.extend(values.into_iter().map(Into::into));
        self
    }

    /// Treat an absent field as `Pending` instead of a malformed status
    #[must_use]
    pub fn pending_when_missing(mut self) -> Self {
        self.missing = MissingField::Pending;
        self
    }

    /// Dotted path of the inspected field
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Text form of a scalar JSON value; `None` for arrays and objects
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl PhasePredicate for FieldPredicate {
    fn evaluate(&self, status: &StructuredStatus) -> Result<Verdict, MalformedStatus> {
        let Some(value) = status.lookup(&self.path) else {
            return match self.missing {
                MissingField::Malformed => Err(MalformedStatus::MissingField(self.path.clone())),
                MissingField::Pending => Ok(Verdict::Pending),
            };
        };

        let text = scalar_text(value).ok_or_else(|| MalformedStatus::WrongType {
            path: self.path.clone(),
            expected: "a scalar",
        })?;

        if self.failure.contains(&text) {
            Ok(Verdict::Failure(format!("{} is {:?}", self.path, text)))
        } else if self.success.contains(&text) {
            Ok(Verdict::Success)
        } else {
            Ok(Verdict::Pending)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn phase(value: Value) -> StructuredStatus {
        StructuredStatus::new(json!({"status": {"phase": value}}))
    }

    #[test]
    fn test_equals() {
        let p = FieldPredicate::equals("status.phase", "healthy");
        assert_eq!(p.evaluate(&phase(json!("healthy"))), Ok(Verdict::Success));
        assert_eq!(p.evaluate(&phase(json!("Pending"))), Ok(Verdict::Pending));
    }

    #[test]
    fn test_failure_set_wins() {
        let p = FieldPredicate::equals("status.phase", "completed").failing_on(["failed"]);
        assert_eq!(
            p.evaluate(&phase(json!("failed"))),
            Ok(Verdict::Failure("status.phase is \"failed\"".to_string()))
        );
        assert_eq!(p.evaluate(&phase(json!("running"))), Ok(Verdict::Pending));
    }

    #[test]
    fn test_missing_field_handling() {
        let doc = StructuredStatus::new(json!({"metadata": {"name": "cluster-example"}}));
        let strict = FieldPredicate::equals("status.phase", "healthy");
        assert_eq!(
            strict.evaluate(&doc),
            Err(MalformedStatus::MissingField("status.phase".to_string()))
        );
        let lenient = strict.pending_when_missing();
        assert_eq!(lenient.evaluate(&doc), Ok(Verdict::Pending));
        assert_eq!(lenient.evaluate(&phase(Value::Null)), Ok(Verdict::Pending));
    }

    #[test]
    fn test_numeric_and_non_scalar_fields() {
        let succeeded = FieldPredicate::equals("status.succeeded", "1");
        let doc = StructuredStatus::new(json!({"status": {"succeeded": 1}}));
        assert_eq!(succeeded.evaluate(&doc), Ok(Verdict::Success));

        let p = FieldPredicate::equals("status.phase", "healthy");
        assert!(matches!(
            p.evaluate(&phase(json!({"nested": true}))),
            Err(MalformedStatus::WrongType { .. })
        ));
    }

    #[test]
    fn test_closure_predicate() {
        let ready = |status: &StructuredStatus| -> Result<Verdict, MalformedStatus> {
            let ready = status.i64_field("status.readyInstances")?;
            let wanted = status.i64_field("spec.instances")?;
            Ok(if ready >= wanted { Verdict::Success } else { Verdict::Pending })
        };
        let doc = StructuredStatus::new(json!({"spec": {"instances": 3}, "status": {"readyInstances": 2}}));
        assert_eq!(ready.evaluate(&doc), Ok(Verdict::Pending));
        assert!(ready.evaluate(&StructuredStatus::default()).is_err());
    }
}
