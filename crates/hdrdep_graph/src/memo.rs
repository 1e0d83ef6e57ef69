//! The shared per-build header memo.
//!
//! Every file reached by any unit is read, fingerprinted and scanned through
//! [`HeaderCache::get`]. Each `(path, search paths)` key owns one
//! [`OnceLock`] cell: the first requester computes it, concurrent requesters
//! block on the same cell, and everyone receives the same `Arc`. The map lock
//! is held only long enough to fetch or insert the cell. Computing a cell
//! never touches the memo again, so waiting on one cannot deadlock.

use crate::search::SearchPaths;
use hdrdep_common::ContentHash;
use hdrdep_scan::{extract, FileDirectives, IncludeKind};
use hdrdep_source::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// One scanned file: its fingerprint, directives, and where its literal
/// includes resolve under the cache's search paths.
#[derive(Debug)]
pub struct ScannedHeader {
    /// Normalized path of the file.
    pub path: PathBuf,
    /// Hash of the raw file bytes.
    pub fingerprint: ContentHash,
    /// Directives in file order.
    pub directives: FileDirectives,
    /// Lookup result for each entry of `directives.includes`; always `None`
    /// for macro includes, which are resolved per unit.
    pub literal_targets: Vec<Option<PathBuf>>,
}

/// A scan result shared by every unit that reaches the file.
pub type ScanResult = Result<Arc<ScannedHeader>, Arc<io::Error>>;

type MemoKey = (PathBuf, Arc<SearchPaths>);

/// At-most-once scanning of files for one build.
pub struct HeaderCache {
    fs: Arc<dyn FileSystem>,
    cells: Mutex<HashMap<MemoKey, Arc<OnceLock<ScanResult>>>>,
    parses: AtomicUsize,
}

impl HeaderCache {
    /// Creates an empty memo reading through `fs`.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            cells: Mutex::new(HashMap::new()),
            parses: AtomicUsize::new(0),
        }
    }

    /// Returns the scan of `path`, computing it on first request.
    ///
    /// Read failures are cached like successes for the rest of the build.
    pub fn get(&self, path: &Path, search: &Arc<SearchPaths>) -> ScanResult {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                cells
                    .entry((path.to_path_buf(), Arc::clone(search)))
                    .or_default(),
            )
        };
        cell.get_or_init(|| self.scan(path, search)).clone()
    }

    fn scan(&self, path: &Path, search: &SearchPaths) -> ScanResult {
        self.parses.fetch_add(1, Ordering::Relaxed);
        let bytes = self.fs.read(path).map_err(Arc::new)?;
        let directives = extract(&bytes);
        let current_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let literal_targets = directives
            .includes
            .iter()
            .map(|entry| match entry.directive.kind() {
                IncludeKind::Macro => None,
                _ if entry.is_next => search.resolve_next(&entry.directive, path, self.fs.as_ref()),
                _ => search.resolve(&entry.directive, current_dir, self.fs.as_ref()),
            })
            .collect();
        tracing::trace!(
            path = %path.display(),
            includes = directives.includes.len(),
            defines = directives.defines.len(),
            "scanned file"
        );
        Ok(Arc::new(ScannedHeader {
            path: path.to_path_buf(),
            fingerprint: ContentHash::from_bytes(&bytes),
            directives,
            literal_targets,
        }))
    }

    /// Number of files actually read and scanned so far.
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::Relaxed)
    }

    /// Number of memo cells.
    pub fn len(&self) -> usize {
        self.cells.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// `true` if nothing has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for HeaderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderCache")
            .field("cells", &self.len())
            .field("parses", &self.parse_count())
            .finish()
    }
}
