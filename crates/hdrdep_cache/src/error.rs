//! Error types for snapshot operations.

use std::path::PathBuf;

/// Errors that can occur while reading or writing the snapshot.
///
/// Loading is fail-safe: every variant raised while reading turns into a cold
/// start with a warning. Only writing surfaces these to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing a cache file.
    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file has an invalid or truncated header.
    #[error("invalid snapshot header in {}: {reason}", path.display())]
    InvalidHeader {
        /// The snapshot file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the checksum of the payload.
    #[error("checksum mismatch in {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        /// The snapshot file path.
        path: PathBuf,
        /// The checksum recorded in the header.
        expected: String,
        /// The checksum computed from the payload.
        actual: String,
    },

    /// The snapshot format version does not match the current version.
    #[error("version mismatch in {}: expected {expected}, got {actual}", path.display())]
    VersionMismatch {
        /// The snapshot file path.
        path: PathBuf,
        /// The expected format version.
        expected: u32,
        /// The format version found in the file.
        actual: u32,
    },

    /// The snapshot was written by another engine version or for another
    /// module.
    #[error("incompatible snapshot {}: {reason}", path.display())]
    Incompatible {
        /// The snapshot file path.
        path: PathBuf,
        /// What did not match.
        reason: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
