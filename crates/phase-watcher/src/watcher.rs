//! Status polling loop
//!
//! `watch` reads the resource, applies the predicate, and either returns a
//! terminal outcome or sleeps one interval. Transient client errors spend a
//! poll from the budget; every other client error ends the watch.

use crate::outcome::{FailureReason, WatchOutcome};
use crate::policy::PollPolicy;
use crate::predicate::{PhasePredicate, Verdict};
use resource_client::{ResourceClient, ResourceClientError, ResourceRef, StructuredStatus};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// One watch: a resource, a budget and a predicate, fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct WatchSession<P> {
    resource: ResourceRef,
    policy: PollPolicy,
    predicate: P,
}

impl<P: PhasePredicate> WatchSession<P> {
    /// Bind a resource, budget and predicate for one watch
    pub fn new(resource: ResourceRef, policy: PollPolicy, predicate: P) -> Self {
        Self {
            resource,
            policy,
            predicate,
        }
    }

    /// Resource being watched
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Poll budget of this session
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll until a terminal outcome, consuming the session
    pub async fn run(self, client: &dyn ResourceClient, cancel: &CancellationToken) -> WatchOutcome {
        watch(&self.resource, &self.policy, &self.predicate, client, cancel).await
    }

    /// Run the session on its own task
    pub fn spawn(self, client: Arc<dyn ResourceClient>, cancel: CancellationToken) -> JoinHandle<WatchOutcome>
    where
        P: 'static,
    {
        tokio::spawn(async move { self.run(client.as_ref(), &cancel).await })
    }
}

/// Map a fatal client error to a failure reason; `None` for retryable errors
fn fatal_reason(error: ResourceClientError) -> Option<FailureReason> {
    match error {
        ResourceClientError::Transport(_) => None,
        ResourceClientError::NotFound(message) => Some(FailureReason::NotFound(message)),
        ResourceClientError::Conflict(message) => Some(FailureReason::Conflict(message)),
        ResourceClientError::Unauthorized(message) => Some(FailureReason::Unauthorized(message)),
        ResourceClientError::Malformed(message) => Some(FailureReason::MalformedStatus(message)),
        ResourceClientError::Api { code, message } => Some(FailureReason::Api { code, message }),
    }
}

/// Resolves when the policy's elapsed budget runs out; never without one
async fn deadline(started: Instant, policy: &PollPolicy) {
    match policy.max_elapsed() {
        Some(limit) => tokio::time::sleep_until(started + limit).await,
        None => std::future::pending().await,
    }
}

/// Poll `resource` until `predicate` reaches a terminal verdict
///
/// - `Success` / `Failure` verdicts return immediately.
/// - `Pending` polls again after `policy.interval()` until the budget is spent,
///   then returns `TimedOut`. No sleep follows the final poll.
/// - Transient client errors count as a poll and are retried.
/// - Fatal client errors and malformed statuses return `Failure`.
/// - Cancellation is honoured before every poll, while a read is in flight and
///   during the sleep.
/// - With `max_elapsed` set, a read still in flight at the deadline ends the
///   watch as `TimedOut`.
pub async fn watch<P>(
    resource: &ResourceRef,
    policy: &PollPolicy,
    predicate: &P,
    client: &dyn ResourceClient,
    cancel: &CancellationToken,
) -> WatchOutcome
where
    P: PhasePredicate + ?Sized,
{
    let started = Instant::now();
    let mut polls: u32 = 0;
    let mut last_status: Option<StructuredStatus> = None;

    loop {
        if cancel.is_cancelled() {
            info!("Watch on {} cancelled after {} polls", resource, polls);
            return WatchOutcome::Cancelled {
                last_status,
                polls_attempted: polls,
            };
        }

        polls += 1;
        let read = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Watch on {} cancelled during poll {}", resource, polls);
                return WatchOutcome::Cancelled {
                    last_status,
                    polls_attempted: polls,
                };
            }
            read = client.get_status(resource) => read,
            () = deadline(started, policy) => {
                warn!("Read of {} still in flight at the deadline (poll {})", resource, polls);
                return WatchOutcome::TimedOut {
                    last_status,
                    polls_attempted: polls,
                };
            }
        };
        match read {
            Ok(status) => match predicate.evaluate(&status) {
                Ok(Verdict::Success) => {
                    info!("{} reached target phase after {} polls", resource, polls);
                    return WatchOutcome::Success { status, polls };
                }
                Ok(Verdict::Failure(reason)) => {
                    warn!("{} reported terminal failure after {} polls: {}", resource, polls, reason);
                    return WatchOutcome::Failure {
                        status: Some(status),
                        reason: FailureReason::Rejected(reason),
                        polls,
                    };
                }
                Ok(Verdict::Pending) => {
                    debug!("{} still pending (poll {}/{})", resource, polls, policy.max_polls());
                    last_status = Some(status);
                }
                Err(malformed) => {
                    error!("{} has a malformed status: {}", resource, malformed);
                    return WatchOutcome::Failure {
                        status: Some(status),
                        reason: FailureReason::MalformedStatus(malformed.to_string()),
                        polls,
                    };
                }
            },
            Err(e) => {
                let message = e.to_string();
                match fatal_reason(e) {
                    Some(reason) => {
                        error!("Giving up on {} after {} polls: {}", resource, polls, message);
                        return WatchOutcome::Failure {
                            status: last_status,
                            reason,
                            polls,
                        };
                    }
                    None => {
                        warn!("Transient error reading {} (poll {}/{}): {}", resource, polls, policy.max_polls(), message);
                    }
                }
            }
        }

        let elapsed = started.elapsed();
        if policy.is_exhausted(polls, elapsed) {
            warn!("{} did not reach target phase within {} polls ({:?})", resource, polls, elapsed);
            return WatchOutcome::TimedOut {
                last_status,
                polls_attempted: polls,
            };
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Watch on {} cancelled after {} polls", resource, polls);
                return WatchOutcome::Cancelled {
                    last_status,
                    polls_attempted: polls,
                };
            }
            () = tokio::time::sleep(policy.next_delay(elapsed)) => {}
        }
    }
}
