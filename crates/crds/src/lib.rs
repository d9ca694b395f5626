//! CloudNativePG CRD Definitions
//!
//! Typed views of the custom resources the lifecycle tooling drives. The
//! operators own the schemas; these types only model the fields we read or
//! write and keep everything else in a flattened remainder.

pub mod references;
pub mod cluster;
pub mod backup;
pub mod object_bucket_claim;

pub use references::*;
pub use cluster::*;
pub use backup::*;
pub use object_bucket_claim::*;
