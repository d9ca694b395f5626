//! Watch outcomes
//!
//! Every way a watch can end is a value. Callers branch on the variant rather
//! than catching errors.

use resource_client::StructuredStatus;
use std::fmt;
use thiserror::Error;

/// Why a watch ended in `Failure`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The predicate reported a terminal failure phase
    #[error("rejected: {0}")]
    Rejected(String),

    /// The watched resource does not exist
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Credentials or RBAC rejected the read
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The API server reported a conflict
    #[error("conflict: {0}")]
    Conflict(String),

    /// The status document lacked expected fields
    #[error("malformed status: {0}")]
    MalformedStatus(String),

    /// Any other non-retryable API error
    #[error("API error {code}: {message}")]
    Api { code: u16, message: String },
}

/// Terminal result of a watch session
#[derive(Debug, Clone, PartialEq)]
pub enum WatchOutcome {
    /// Predicate reported success
    Success { status: StructuredStatus, polls: u32 },

    /// Predicate reported failure, or a fatal client error occurred
    Failure {
        status: Option<StructuredStatus>,
        reason: FailureReason,
        polls: u32,
    },

    /// Poll budget exhausted while still pending
    TimedOut {
        last_status: Option<StructuredStatus>,
        polls_attempted: u32,
    },

    /// Caller cancelled the watch
    Cancelled {
        last_status: Option<StructuredStatus>,
        polls_attempted: u32,
    },
}

impl WatchOutcome {
    /// Whether the predicate reported success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Number of status reads issued before the watch ended
    pub fn polls(&self) -> u32 {
        match self {
            Self::Success { polls, .. } | Self::Failure { polls, .. } => *polls,
            Self::TimedOut { polls_attempted, .. } | Self::Cancelled { polls_attempted, .. } => {
                *polls_attempted
            }
        }
    }

    /// Most recent status document observed, if any
    pub fn last_status(&self) -> Option<&StructuredStatus> {
        match self {
            Self::Success { status, .. } => Some(status),
            Self::Failure { status, .. } => status.as_ref(),
            Self::TimedOut { last_status, .. } | Self::Cancelled { last_status, .. } => {
                last_status.as_ref()
            }
        }
    }

    /// Failure reason, for `Failure` outcomes
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            Self::Failure { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for WatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { polls, .. } => write!(f, "succeeded after {} polls", polls),
            Self::Failure { reason, polls, .. } => write!(f, "failed after {} polls: {}", polls, reason),
            Self::TimedOut { polls_attempted, .. } => {
                write!(f, "timed out after {} polls", polls_attempted)
            }
            Self::Cancelled { polls_attempted, .. } => {
                write!(f, "cancelled after {} polls", polls_attempted)
            }
        }
    }
}
