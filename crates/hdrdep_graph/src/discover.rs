//! Translation-unit discovery under source roots.

use crate::error::GraphError;
use hdrdep_source::{normalize_path, FileSystem};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Expands `roots` into translation units.
///
/// A root that is a file is taken as is, whatever its extension. A root that
/// is a directory is walked recursively and contributes every file whose
/// extension is in `extensions`, in sorted order. Duplicates keep their first
/// position. A root that does not exist is a [`GraphError::Io`].
pub fn discover_sources(
    fs: &dyn FileSystem,
    roots: &[PathBuf],
    extensions: &[String],
) -> Result<Vec<PathBuf>, GraphError> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for root in roots {
        let root = normalize_path(root);
        if fs.is_file(&root) {
            if seen.insert(root.clone()) {
                sources.push(root);
            }
            continue;
        }
        for file in walk(fs, &root)? {
            if has_extension(&file, extensions) && seen.insert(file.clone()) {
                sources.push(file);
            }
        }
    }
    tracing::debug!(roots = roots.len(), sources = sources.len(), "discovered sources");
    Ok(sources)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

/// All files under `dir`, depth-first in sorted order.
///
/// A directory reached twice through symbolic links is walked once, under
/// the first path that reached it.
fn walk(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>, GraphError> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let real = fs.canonicalize(&current).map_err(|source| GraphError::Io {
            path: current.clone(),
            source,
        })?;
        if !visited.insert(real) {
            tracing::debug!(dir = %current.display(), "directory already walked");
            continue;
        }
        let mut entries = fs.read_dir(&current).map_err(|source| GraphError::Io {
            path: current.clone(),
            source,
        })?;
        entries.sort();
        let mut subdirs = Vec::new();
        for entry in entries {
            if fs.is_file(&entry) {
                files.push(entry);
            } else if fs.is_dir(&entry) {
                subdirs.push(entry);
            }
        }
        stack.extend(subdirs.into_iter().rev());
    }
    files.sort();
    Ok(files)
}
