//! Resource client errors
//!
//! Every failure is classified as either transient (worth another poll) or
//! fatal, so callers never have to guess from an HTTP status code.

use crate::status::MalformedStatus;
use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceClientError {
    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Create or update collided with the current object state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Network failure, timeout, throttling or server-side hiccup; retryable
    #[error("Transport error: {0}")]
    Transport(String),

    /// Credentials rejected or missing RBAC permissions
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Response or request body did not have the expected shape
    #[error("Malformed resource: {0}")]
    Malformed(String),

    /// Any other API rejection (validation, bad request, ...)
    #[error("Kubernetes API error {code}: {message}")]
    Api { code: u16, message: String },
}

impl ResourceClientError {
    /// Whether the same request may succeed if issued again later
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Classify an HTTP status code returned by the API server
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            404 | 410 => Self::NotFound(message),
            409 => Self::Conflict(message),
            401 | 403 => Self::Unauthorized(message),
            408 | 429 | 500..=599 => Self::Transport(message),
            _ => Self::Api { code, message },
        }
    }
}

impl From<kube::Error> for ResourceClientError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => Self::from_status(response.code, response.message),
            kube::Error::SerdeError(e) => Self::Malformed(e.to_string()),
            kube::Error::Auth(e) => Self::Unauthorized(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<MalformedStatus> for ResourceClientError {
    fn from(error: MalformedStatus) -> Self {
        Self::Malformed(error.to_string())
    }
}

impl From<serde_json::Error> for ResourceClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::Malformed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(ResourceClientError::from_status(404, "gone"), ResourceClientError::NotFound(_)));
        assert!(matches!(ResourceClientError::from_status(409, "exists"), ResourceClientError::Conflict(_)));
        assert!(matches!(ResourceClientError::from_status(403, "rbac"), ResourceClientError::Unauthorized(_)));
        assert!(ResourceClientError::from_status(503, "unavailable").is_transient());
        assert!(ResourceClientError::from_status(429, "throttled").is_transient());
        assert_eq!(
            ResourceClientError::from_status(422, "invalid"),
            ResourceClientError::Api { code: 422, message: "invalid".to_string() }
        );
    }

    #[test]
    fn test_only_transport_is_transient() {
        assert!(ResourceClientError::Transport("reset".to_string()).is_transient());
        assert!(!ResourceClientError::NotFound("x".to_string()).is_transient());
        assert!(!ResourceClientError::Unauthorized("x".to_string()).is_transient());
        assert!(!ResourceClientError::Malformed("x".to_string()).is_transient());
    }
}
