//! File-system abstraction used for every read the dependency engine performs.
//!
//! The engine never touches `std::fs` directly: the graph builder, source
//! discovery and diagnostic rendering all go through a [`FileSystem`]. The disk
//! implementation is used by the CLI; [`MemoryFileSystem`] backs tests.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Read-only view of a file system.
pub trait FileSystem: Send + Sync + Debug {
    /// Reads the full contents of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Returns `true` if `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Returns `true` if `path` names an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists the entries of a directory as full paths, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// The path with every symbolic link resolved. File systems without links
    /// return it unchanged.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

/// Implementation backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFileSystem;

impl FileSystem for DiskFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}

/// In-memory file system keyed by absolute path.
///
/// Directories exist implicitly as prefixes of file paths. Clones share the
/// same storage, so a test can edit files between two engine runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MemoryFileSystem {
    /// Creates an empty file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a file.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Removes a file, returning `true` if it existed.
    pub fn remove_file(&self, path: impl AsRef<Path>) -> bool {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(path.as_ref()).is_some()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.keys().any(|p| p != path && p.starts_with(path))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<PathBuf> = Vec::new();
        for file in files.keys() {
            let Ok(rest) = file.strip_prefix(path) else {
                continue;
            };
            if let Some(first) = rest.components().next() {
                let child = path.join(first);
                if !entries.contains(&child) {
                    entries.push(child);
                }
            }
        }
        if entries.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", path.display()),
            ));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_read_and_replace() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a.c", "int a;");
        assert_eq!(fs.read(Path::new("/src/a.c")).unwrap(), b"int a;");
        fs.add_file("/src/a.c", "int b;");
        assert_eq!(fs.read(Path::new("/src/a.c")).unwrap(), b"int b;");
    }

    #[test]
    fn memory_missing_file_is_not_found() {
        let fs = MemoryFileSystem::new();
        let err = fs.read(Path::new("/nope.h")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!fs.is_file(Path::new("/nope.h")));
    }

    #[test]
    fn memory_directories_are_implicit() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/src/a.c", "");
        fs.add_file("/src/sub/b.c", "");
        assert!(fs.is_dir(Path::new("/src")));
        assert!(fs.is_dir(Path::new("/src/sub")));
        assert!(!fs.is_dir(Path::new("/src/a.c")));

        let mut entries = fs.read_dir(Path::new("/src")).unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![PathBuf::from("/src/a.c"), PathBuf::from("/src/sub")]
        );
    }

    #[test]
    fn memory_clones_share_storage() {
        let fs = MemoryFileSystem::new();
        let view = fs.clone();
        fs.add_file("/x.h", "");
        assert!(view.is_file(Path::new("/x.h")));
        assert!(fs.remove_file("/x.h"));
        assert!(!view.is_file(Path::new("/x.h")));
    }

    #[test]
    fn disk_reads_real_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.h");
        std::fs::write(&path, "#pragma once\n").unwrap();
        let fs = DiskFileSystem;
        assert!(fs.is_file(&path));
        assert!(fs.is_dir(dir.path()));
        assert_eq!(fs.read(&path).unwrap(), b"#pragma once\n");
        assert_eq!(fs.read_dir(dir.path()).unwrap(), vec![path]);
    }
}
