//! Poll budgets

use std::time::Duration;
use thiserror::Error;

/// Rejected poll policy parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,

    #[error("maximum poll count must be greater than zero")]
    ZeroPolls,

    #[error("maximum elapsed time must be greater than zero")]
    ZeroElapsed,
}

/// How often to poll and when to give up
///
/// The budget is exhausted after `max_polls` polls, or once `max_elapsed`
/// (when set) has passed since the first poll, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    max_polls: u32,
    max_elapsed: Option<Duration>,
}

impl PollPolicy {
    /// Interval used by the operator test suites (5 seconds)
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// Poll count used by the operator test suites before declaring a timeout
    pub const DEFAULT_MAX_POLLS: u32 = 5000;

    /// Create a policy; both values must be strictly positive
    pub fn new(interval: Duration, max_polls: u32) -> Result<Self, PolicyError> {
        if interval.is_zero() {
            return Err(PolicyError::ZeroInterval);
        }
        if max_polls == 0 {
            return Err(PolicyError::ZeroPolls);
        }
        Ok(Self {
            interval,
            max_polls,
            max_elapsed: None,
        })
    }

    /// Add a wall-clock deadline on top of the poll count
    pub fn with_max_elapsed(self, max_elapsed: Duration) -> Result<Self, PolicyError> {
        if max_elapsed.is_zero() {
            return Err(PolicyError::ZeroElapsed);
        }
        Ok(Self {
            max_elapsed: Some(max_elapsed),
            ..self
        })
    }

    /// Sleep between two polls
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll count after which the watch times out
    pub fn max_polls(&self) -> u32 {
        self.max_polls
    }

    /// Wall-clock deadline, if any
    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed
    }

    /// Whether no further poll is allowed after `polls` polls and `elapsed` time
    pub fn is_exhausted(&self, polls: u32, elapsed: Duration) -> bool {
        polls >= self.max_polls || self.max_elapsed.is_some_and(|limit| elapsed >= limit)
    }

    /// Sleep before the next poll, shortened so the deadline is not overshot
    pub fn next_delay(&self, elapsed: Duration) -> Duration {
        match self.max_elapsed {
            Some(limit) => self.interval.min(limit.saturating_sub(elapsed)),
            None => self.interval,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_polls: Self::DEFAULT_MAX_POLLS,
            max_elapsed: None,
        }
    }
}
