//! Error types for graph construction.

use hdrdep_common::InternalError;
use std::path::PathBuf;

/// Errors that stop a graph build.
///
/// Unresolved or ambiguous includes are not errors; they are recorded on the
/// graph. Only failures at the boundary end the build.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A translation-unit root or source directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The build was cancelled through its [`CancellationToken`](crate::CancellationToken).
    #[error("graph build cancelled")]
    Cancelled,

    /// A bug in hdrdep.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
