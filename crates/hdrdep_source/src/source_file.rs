//! Source file representation with line-start indexing for fast line/column lookup.

use crate::span::FileId;
use hdrdep_common::ContentHash;
use std::path::PathBuf;

/// A C/C++/Objective-C source or header file loaded for diagnostic rendering.
///
/// The fingerprint is computed over the raw bytes. Headers in the wild are not
/// always valid UTF-8, so each invalid byte is decoded as a single `?`: byte
/// offsets from the directive extractor stay valid in the decoded text.
pub struct SourceFile {
    /// The unique identifier for this file within the [`SourceDb`](crate::SourceDb).
    pub id: FileId,
    /// The filesystem path of this file (or a synthetic name for in-memory sources).
    pub path: PathBuf,
    /// The decoded text content of the file.
    pub content: String,
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
    /// Fingerprint of the raw file bytes.
    pub content_hash: ContentHash,
}

impl SourceFile {
    /// Creates a new `SourceFile` from raw bytes.
    pub fn from_bytes(id: FileId, path: PathBuf, bytes: &[u8]) -> Self {
        let content_hash = ContentHash::from_bytes(bytes);
        let content = decode_keeping_offsets(bytes);
        let line_starts = compute_line_starts(&content);
        Self {
            id,
            path,
            content,
            line_starts,
            content_hash,
        }
    }

    /// Converts a byte offset into 1-indexed (line, column) coordinates.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line = (line_idx as u32) + 1;
        let col = byte_offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Returns a substring of the file content between byte offsets.
    ///
    /// Offsets are clamped to the content length.
    pub fn snippet(&self, start: u32, end: u32) -> &str {
        let len = self.content.len();
        let end = (end as usize).min(len);
        let start = (start as usize).min(end);
        self.content.get(start..end).unwrap_or("")
    }
}

/// Decodes `bytes` as UTF-8, replacing every byte of an invalid sequence with
/// `?` so the result has exactly `bytes.len()` bytes.
fn decode_keeping_offsets(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let bad = err.error_len().unwrap_or(after.len());
                out.extend(std::iter::repeat('?').take(bad));
                rest = &after[bad..];
            }
        }
    }
}

fn compute_line_starts(content: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}
