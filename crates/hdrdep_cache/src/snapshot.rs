//! The persisted snapshot of the previous build.
//!
//! The file is `<cache_dir>/snapshot.bin`: a 4-byte little-endian header
//! length, a bincode [`SnapshotHeader`], then a bincode list of
//! [`SnapshotRecord`]s sorted by path. The header carries magic bytes, the
//! format version, the engine version, the module name and a checksum of the
//! payload.

use crate::error::CacheError;
use hdrdep_common::ContentHash;
use hdrdep_graph::IncludeGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Name of the snapshot file within the cache directory.
pub const SNAPSHOT_FILE: &str = "snapshot.bin";

/// Magic bytes identifying a snapshot file.
const SNAPSHOT_MAGIC: [u8; 4] = *b"HDEP";

/// Current snapshot format version. Increment on breaking changes to the
/// header or record layout.
const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Upper bound on the encoded header, checked before it is decoded.
const MAX_HEADER_LEN: usize = 4096;

/// Upper bound on the bytes the payload decoder may claim.
const MAX_PAYLOAD_LEN: usize = 1 << 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotHeader {
    magic: [u8; 4],
    format_version: u32,
    engine_version: String,
    module: String,
    checksum: ContentHash,
}

/// What the previous build knew about one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Normalized path.
    pub path: PathBuf,
    /// `true` if the file was a translation-unit root.
    pub is_root: bool,
    /// Hash of the file bytes.
    pub fingerprint: ContentHash,
    /// Transitive header set, sorted.
    pub transitive_headers: Vec<PathBuf>,
    /// Macro environment digest, for units with macro includes.
    pub macro_environment: Option<ContentHash>,
    /// Whether any include was unresolved.
    pub had_unresolved: bool,
}

impl SnapshotRecord {
    /// The transitive header set as a set.
    pub fn header_set(&self) -> BTreeSet<PathBuf> {
        self.transitive_headers.iter().cloned().collect()
    }
}

/// All records of one build, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: BTreeMap<PathBuf, SnapshotRecord>,
}

impl Snapshot {
    /// Captures every file of `graph`.
    pub fn from_graph(graph: &IncludeGraph) -> Self {
        let records = graph
            .records()
            .map(|r| {
                (
                    r.path.clone(),
                    SnapshotRecord {
                        path: r.path.clone(),
                        is_root: r.is_root,
                        fingerprint: r.fingerprint,
                        transitive_headers: r.transitive_headers.iter().cloned().collect(),
                        macro_environment: r.macro_environment,
                        had_unresolved: r.has_unresolved,
                    },
                )
            })
            .collect();
        Self { records }
    }

    /// The record for `path`, if the previous build saw it.
    pub fn get(&self, path: &Path) -> Option<&SnapshotRecord> {
        self.records.get(path)
    }

    /// All records, ordered by path.
    pub fn records(&self) -> impl Iterator<Item = &SnapshotRecord> {
        self.records.values()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` if the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serializes the snapshot with its header.
    pub fn encode(&self, engine_version: &str, module: &str) -> Result<Vec<u8>, CacheError> {
        let records: Vec<&SnapshotRecord> = self.records.values().collect();
        let payload = bincode::serde::encode_to_vec(&records, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            format_version: SNAPSHOT_FORMAT_VERSION,
            engine_version: engine_version.to_string(),
            module: module.to_string(),
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);
        Ok(output)
    }

    /// Parses and validates snapshot bytes read from `path`.
    pub fn decode(
        raw: &[u8],
        path: &Path,
        engine_version: &str,
        module: &str,
    ) -> Result<Self, CacheError> {
        let invalid = |reason: &str| CacheError::InvalidHeader {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let len_bytes: [u8; 4] = raw
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| invalid("file shorter than the header length"))?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        if header_len > MAX_HEADER_LEN {
            return Err(invalid("header length out of range"));
        }
        let header_bytes = raw
            .get(4..4 + header_len)
            .ok_or_else(|| invalid("truncated header"))?;
        let header_config = bincode::config::standard().with_limit::<MAX_HEADER_LEN>();
        let (header, _): (SnapshotHeader, usize) =
            bincode::serde::decode_from_slice(header_bytes, header_config)
                .map_err(|e| invalid(&e.to_string()))?;

        if header.magic != SNAPSHOT_MAGIC {
            return Err(invalid("bad magic bytes"));
        }
        if header.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                path: path.to_path_buf(),
                expected: SNAPSHOT_FORMAT_VERSION,
                actual: header.format_version,
            });
        }
        if header.engine_version != engine_version {
            return Err(CacheError::Incompatible {
                path: path.to_path_buf(),
                reason: format!("written by engine version {}", header.engine_version),
            });
        }
        if header.module != module {
            return Err(CacheError::Incompatible {
                path: path.to_path_buf(),
                reason: format!("written for module '{}'", header.module),
            });
        }

        let payload = &raw[4 + header_len..];
        let actual = ContentHash::from_bytes(payload);
        if actual != header.checksum {
            return Err(CacheError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: header.checksum.to_string(),
                actual: actual.to_string(),
            });
        }

        let payload_config = bincode::config::standard().with_limit::<MAX_PAYLOAD_LEN>();
        let (records, _): (Vec<SnapshotRecord>, usize) =
            bincode::serde::decode_from_slice(payload, payload_config).map_err(
                |e| CacheError::Serialization {
                    reason: e.to_string(),
                },
            )?;
        Ok(Self {
            records: records.into_iter().map(|r| (r.path.clone(), r)).collect(),
        })
    }

    /// Loads the snapshot from `cache_dir`.
    ///
    /// Returns `None` if there is no snapshot or it cannot be used; the caller
    /// then starts cold. Unusable snapshots are logged as warnings.
    pub fn load(cache_dir: &Path, engine_version: &str, module: &str) -> Option<Self> {
        let path = cache_dir.join(SNAPSHOT_FILE);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no snapshot; cold start");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read snapshot; cold start");
                return None;
            }
        };
        match Self::decode(&raw, &path, engine_version, module) {
            Ok(snapshot) => {
                tracing::debug!(path = %path.display(), records = snapshot.len(), "snapshot loaded");
                Some(snapshot)
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding snapshot; cold start");
                None
            }
        }
    }

    /// Writes the snapshot to `cache_dir`, replacing any previous one.
    ///
    /// The bytes go to a temporary file in the same directory which is then
    /// renamed over the snapshot, so readers see the old or the new snapshot
    /// and never a partial one.
    pub fn save(&self, cache_dir: &Path, engine_version: &str, module: &str) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;
        let bytes = self.encode(engine_version, module)?;
        let path = cache_dir.join(SNAPSHOT_FILE);
        let tmp = cache_dir.join(format!("{SNAPSHOT_FILE}.{}.tmp", std::process::id()));
        std::fs::write(&tmp, &bytes).map_err(|e| CacheError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(CacheError::Io { path, source: e });
        }
        tracing::debug!(path = %path.display(), records = self.len(), "snapshot committed");
        Ok(())
    }
}
