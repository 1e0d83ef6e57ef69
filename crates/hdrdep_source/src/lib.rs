//! File access, source files, span tracking, and source maps for diagnostics.
//!
//! This crate provides the [`FileSystem`] abstraction through which every file
//! read of the dependency engine goes, lexical path normalization, the
//! [`SourceDb`] used when rendering diagnostics, and [`FileId`] / [`Span`] /
//! [`ResolvedSpan`] for locating directives inside files.

#![warn(missing_docs)]

pub mod fs;
pub mod path;
pub mod resolved_span;
pub mod source_db;
pub mod source_file;
pub mod span;

pub use fs::{DiskFileSystem, FileSystem, MemoryFileSystem};
pub use path::normalize_path;
pub use resolved_span::ResolvedSpan;
pub use source_db::SourceDb;
pub use source_file::SourceFile;
pub use span::{FileId, Span};
