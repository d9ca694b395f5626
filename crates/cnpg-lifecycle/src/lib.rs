//! CloudNativePG Lifecycle
//!
//! Operations used by the operator test suites: deploy and patch clusters, run
//! backups, claim buckets, run benchmark jobs, and wait for each of them to
//! settle through the phase watcher.
//!
//! # Example
//!
//! ```no_run
//! use cnpg_lifecycle::{load_manifest, Lifecycle};
//! use phase_watcher::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let lifecycle = Lifecycle::try_default("pg-test").await?;
//! let cluster = lifecycle.deploy_cluster(load_manifest("deployment/cluster.yaml")?).await?;
//!
//! let outcome = lifecycle
//!     .wait_until_cluster_healthy(cluster.name(), &CancellationToken::new())
//!     .await;
//! println!("{}: {}", cluster, outcome);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod lifecycle;
pub mod manifest;
pub mod pods;
pub mod postgres;
pub mod predicates;

pub use error::LifecycleError;
pub use lifecycle::Lifecycle;
pub use manifest::{load_manifest, load_manifests, manifest_name, parse_manifest, parse_manifests, write_versioned_manifest};
pub use pods::{DatabaseCredentials, PodInspector};
pub use predicates::{backup_finished, cluster_healthy, JobFinished};
