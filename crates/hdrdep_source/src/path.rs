//! Lexical path normalization.

use std::path::{Component, Path, PathBuf};

/// Folds `.` and `..` components without touching the file system.
///
/// Two spellings of the same header (`inc/../inc/a.h` and `inc/a.h`) must map
/// to one graph node, and canonicalization would follow symlinks and require
/// the file to exist. A `..` that would climb above the root is dropped for
/// absolute paths and kept for relative ones.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::RootDir | Component::Prefix(_) => out.push(component.as_os_str()),
        }
    }
    out
}
