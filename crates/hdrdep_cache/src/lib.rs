//! Incremental state for the dependency engine.
//!
//! The only long-lived state is one binary snapshot per module: the
//! fingerprint, transitive header set and macro environment of every file
//! seen by the last successful build. Comparing a fresh [`IncludeGraph`]
//! against it yields the [`StaleSet`], the translation units that must be
//! recompiled and why.
//!
//! Reads are fail-safe: a missing, corrupt or incompatible snapshot is a cold
//! start, never an error. Writes replace the snapshot atomically.
//!
//! [`IncludeGraph`]: hdrdep_graph::IncludeGraph

#![warn(missing_docs)]

pub mod error;
pub mod snapshot;
pub mod stale;
pub mod store;

pub use error::CacheError;
pub use snapshot::{Snapshot, SnapshotRecord, SNAPSHOT_FILE};
pub use stale::{compute_stale, StaleReason, StaleSet};
pub use store::IncrementalStore;
