//! Include graph construction for native translation units.
//!
//! Given a list of translation-unit roots, the [`GraphBuilder`] follows every
//! include and import directive through the [`SearchPaths`], reducing macro
//! includes against each unit's own macro table, and produces a deterministic
//! [`IncludeGraph`]: one [`SourceRecord`] per file reached, with its
//! fingerprint and transitive header set.
//!
//! Files are parsed at most once per build through the shared
//! [`HeaderCache`], no matter how many units include them. Units run in
//! parallel on a `rayon` pool.

#![warn(missing_docs)]

pub mod builder;
pub mod discover;
pub mod error;
pub mod graph;
pub mod memo;
pub mod report;
pub mod search;

pub use builder::{BuildOutcome, CancellationToken, GraphBuilder, IncludeIssue};
pub use discover::discover_sources;
pub use error::GraphError;
pub use graph::{IncludeGraph, Resolution, ResolvedInclude, SourceRecord};
pub use memo::{HeaderCache, ScannedHeader};
pub use report::report_issues;
pub use search::SearchPaths;
