//! Resource Phase Watcher
//!
//! Polls a Kubernetes resource at a fixed interval until a predicate over its
//! status reports a terminal verdict, the poll budget runs out, or the caller
//! cancels. Every ending is returned as a [`WatchOutcome`] value.
//!
//! # Example
//!
//! ```no_run
//! use phase_watcher::{watch, CancellationToken, FieldPredicate, PollPolicy, WatchOutcome};
//! use resource_client::{KubeResourceClient, ResourceRef};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeResourceClient::try_default().await?;
//! let cluster = ResourceRef::new("postgresql.cnpg.io", "v1", "clusters", "pg-test", "cluster-example");
//! let policy = PollPolicy::new(Duration::from_secs(5), 120)?;
//! let healthy = FieldPredicate::equals("status.phase", "Cluster in healthy state").pending_when_missing();
//!
//! match watch(&cluster, &policy, &healthy, &client, &CancellationToken::new()).await {
//!     WatchOutcome::Success { polls, .. } => println!("healthy after {polls} polls"),
//!     other => println!("cluster did not become healthy: {other}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod outcome;
pub mod policy;
pub mod predicate;
pub mod watcher;

pub use outcome::{FailureReason, WatchOutcome};
pub use policy::{PolicyError, PollPolicy};
pub use predicate::{FieldPredicate, MissingField, PhasePredicate, Verdict};
pub use tokio_util::sync::CancellationToken;
pub use watcher::{watch, WatchSession};
