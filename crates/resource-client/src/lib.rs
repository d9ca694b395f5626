//! Kubernetes Resource Client
//!
//! A small client for reading and mutating namespaced custom resources
//! (or built-in kinds such as `batch/v1` Jobs) by group/version/plural, with
//! errors classified into retryable and fatal conditions.
//!
//! # Example
//!
//! ```no_run
//! use resource_client::{KubeResourceClient, ResourceClient, ResourceRef};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeResourceClient::try_default().await?;
//! let cluster = ResourceRef::new("postgresql.cnpg.io", "v1", "clusters", "pg-test", "cluster-example");
//!
//! let status = client.get_status(&cluster).await?;
//! println!("phase: {}", status.str_field("status.phase")?);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod reference;
pub mod status;
#[path = "trait.rs"]
pub mod client_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeResourceClient;
pub use client_trait::{Deletion, ResourceClient};
pub use error::ResourceClientError;
pub use reference::ResourceRef;
pub use status::{MalformedStatus, StructuredStatus};
#[cfg(feature = "test-util")]
pub use mock::MockResourceClient;
