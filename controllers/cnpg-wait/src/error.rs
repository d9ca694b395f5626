//! Controller-specific error types.
//!
//! This module defines error types specific to the wait command
//! that are not covered by upstream library errors.

use cnpg_lifecycle::LifecycleError;
use phase_watcher::PolicyError;
use thiserror::Error;

/// Errors that can occur before a watch starts.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Poll budget rejected
    #[error("Invalid poll policy: {0}")]
    Policy(#[from] PolicyError),

    /// Kubernetes client could not be created
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
}
