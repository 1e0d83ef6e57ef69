//! Header lookup along ordered search directories.

use hdrdep_scan::{IncludeDirective, IncludeKind};
use hdrdep_source::{normalize_path, FileSystem};
use std::path::{Path, PathBuf};

/// Ordered directories searched for included headers.
///
/// Quoted includes look next to the including file, then in `quote_dirs`, then
/// in `include_dirs`. System includes look in `include_dirs` only. The first
/// existing file wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SearchPaths {
    /// Directories searched by quoted includes only (`-iquote`).
    pub quote_dirs: Vec<PathBuf>,
    /// Directories searched by both quoted and system includes (`-I`).
    pub include_dirs: Vec<PathBuf>,
}

impl SearchPaths {
    /// Creates search paths from quote and include directories.
    pub fn new(quote_dirs: Vec<PathBuf>, include_dirs: Vec<PathBuf>) -> Self {
        Self {
            quote_dirs,
            include_dirs,
        }
    }

    /// Finds the file `directive` names, looking in `current_dir` first for
    /// quoted includes. Macro directives are never searched.
    ///
    /// The returned path is lexically normalized, so one header reached
    /// through different spellings maps to one path.
    pub fn resolve(
        &self,
        directive: &IncludeDirective,
        current_dir: &Path,
        fs: &dyn FileSystem,
    ) -> Option<PathBuf> {
        let value = Path::new(directive.value());
        if value.is_absolute() {
            if directive.kind() == IncludeKind::Macro {
                return None;
            }
            let path = normalize_path(value);
            return fs.is_file(&path).then_some(path);
        }
        self.search_order(directive.kind(), current_dir)
            .into_iter()
            .map(|dir| normalize_path(&dir.join(value)))
            .find(|candidate| fs.is_file(candidate))
    }

    /// Finds the file an `#include_next` in `including` names.
    ///
    /// The search starts after the configured directory that holds
    /// `including`. If no configured directory holds it, the search is the
    /// one [`resolve`](Self::resolve) does. `including` itself never matches.
    pub fn resolve_next(
        &self,
        directive: &IncludeDirective,
        including: &Path,
        fs: &dyn FileSystem,
    ) -> Option<PathBuf> {
        let current_dir = including.parent().unwrap_or_else(|| Path::new(""));
        let value = Path::new(directive.value());
        if value.is_absolute() {
            return self
                .resolve(directive, current_dir, fs)
                .filter(|path| path != including);
        }
        let configured: Vec<&Path> = match directive.kind() {
            IncludeKind::Quoted => self
                .quote_dirs
                .iter()
                .chain(&self.include_dirs)
                .map(PathBuf::as_path)
                .collect(),
            IncludeKind::System => self.include_dirs.iter().map(PathBuf::as_path).collect(),
            IncludeKind::Macro => return None,
        };
        let dirs = match configured
            .iter()
            .position(|dir| normalize_path(dir) == current_dir)
        {
            Some(found_in) => configured[found_in + 1..].to_vec(),
            None => self.search_order(directive.kind(), current_dir),
        };
        dirs.into_iter()
            .map(|dir| normalize_path(&dir.join(value)))
            .find(|candidate| candidate != including && fs.is_file(candidate))
    }

    /// Directories consulted for a directive of `kind`, in order.
    pub fn search_order<'a>(&'a self, kind: IncludeKind, current_dir: &'a Path) -> Vec<&'a Path> {
        match kind {
            IncludeKind::Quoted => std::iter::once(current_dir)
                .chain(self.quote_dirs.iter().map(PathBuf::as_path))
                .chain(self.include_dirs.iter().map(PathBuf::as_path))
                .collect(),
            IncludeKind::System => self.include_dirs.iter().map(PathBuf::as_path).collect(),
            IncludeKind::Macro => Vec::new(),
        }
    }
}
