//! Locations of directives: a loaded file plus a byte range within it.

use serde::{Deserialize, Serialize};

/// Index of a file in a [`SourceDb`](crate::SourceDb).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// Stands for "no file"; only [`Span::DUMMY`] uses it.
    pub const DUMMY: FileId = FileId(u32::MAX);

    /// The id of the `index`-th loaded file.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the file in the database's file table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The bytes `start..end` of a loaded file.
///
/// Directive spans cover one logical line: from the `#` (or the whitespace
/// before it) up to, not including, the terminating newline. Diagnostics
/// without a location carry [`Span::DUMMY`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    /// The file the range belongs to.
    pub file: FileId,
    /// First byte (inclusive).
    pub start: u32,
    /// End byte (exclusive).
    pub end: u32,
}

impl Span {
    /// A span pointing nowhere, for file-level or cross-file diagnostics.
    pub const DUMMY: Span = Span {
        file: FileId::DUMMY,
        start: 0,
        end: 0,
    };

    /// Creates a span over `start..end` of `file`.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// Length in bytes. An inverted range counts as empty.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// `true` if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` for [`Span::DUMMY`] and any other span without a file.
    pub fn is_dummy(&self) -> bool {
        self.file == FileId::DUMMY
    }
}
