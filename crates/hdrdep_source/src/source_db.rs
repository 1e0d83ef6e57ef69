//! Database of source files whose directives are referenced by diagnostics.

use crate::fs::FileSystem;
use crate::resolved_span::ResolvedSpan;
use crate::source_file::SourceFile;
use crate::span::{FileId, Span};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Owns loaded source text and resolves [`FileId`] + byte offsets to
/// line/column coordinates.
///
/// A path is loaded at most once; loading it again returns the existing id.
pub struct SourceDb {
    files: Vec<SourceFile>,
    by_path: HashMap<PathBuf, FileId>,
}

impl SourceDb {
    /// Creates an empty source database.
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    /// Loads a file through the given file system and returns its [`FileId`].
    pub fn load_file(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<FileId, io::Error> {
        if let Some(id) = self.by_path.get(path) {
            return Ok(*id);
        }
        let bytes = fs.read(path)?;
        Ok(self.insert(path.to_path_buf(), &bytes))
    }

    /// Adds a source file from an in-memory string (useful for tests).
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: &str) -> FileId {
        self.insert(name.into(), content.as_bytes())
    }

    fn insert(&mut self, path: PathBuf, bytes: &[u8]) -> FileId {
        let id = FileId::from_index(self.files.len());
        self.by_path.insert(path.clone(), id);
        self.files.push(SourceFile::from_bytes(id, path, bytes));
        id
    }

    /// Returns the [`SourceFile`] for the given [`FileId`].
    ///
    /// # Panics
    ///
    /// Panics if the `FileId` is invalid.
    pub fn get_file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    /// Resolves a [`Span`] to human-readable line/column coordinates.
    pub fn resolve_span(&self, span: Span) -> ResolvedSpan {
        let file = self.get_file(span.file);
        let (start_line, start_col) = file.line_col(span.start);
        let (end_line, end_col) = file.line_col(span.end.saturating_sub(1).max(span.start));
        ResolvedSpan {
            file_path: file.path.clone(),
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Returns the source text corresponding to a [`Span`].
    pub fn snippet(&self, span: Span) -> &str {
        self.get_file(span.file).snippet(span.start, span.end)
    }
}

impl Default for SourceDb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    #[test]
    fn resolve_span() {
        let mut db = SourceDb::new();
        let id = db.add_source("main.c", "int a;\n#include <b.h>\n");
        let span = Span::new(id, 16, 21);
        let resolved = db.resolve_span(span);
        assert_eq!(resolved.file_path, PathBuf::from("main.c"));
        assert_eq!(resolved.start_line, 2);
        assert_eq!(resolved.start_col, 10);
        assert_eq!(db.snippet(span), "<b.h>");
    }

    #[test]
    fn load_same_path_twice_reuses_id() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/p/a.h", "#define A 1\n");
        let mut db = SourceDb::new();
        let first = db.load_file(&fs, Path::new("/p/a.h")).unwrap();
        let second = db.load_file(&fs, Path::new("/p/a.h")).unwrap();
        assert_eq!(first, second);
        assert_eq!(db.get_file(first).content, "#define A 1\n");
    }

    #[test]
    fn load_missing_file_errors() {
        let fs = MemoryFileSystem::new();
        let mut db = SourceDb::new();
        assert!(db.load_file(&fs, Path::new("/nope.h")).is_err());
    }
}
