//! Directive extraction from raw C, C++ and Objective-C text.
//!
//! The extractor is deliberately permissive. It folds the text into logical
//! lines (joining backslash continuations and dropping comments), then looks
//! at each line that starts with `#`. Conditional compilation is not
//! interpreted: every textual `#include`, `#include_next`, `#import` and
//! `#define` is reported, in file order.

use crate::directive::{classify, IncludeDirective};
use crate::macros::MacroDefinition;

/// An include or import directive and the byte range of its logical line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeEntry {
    /// The classified directive.
    pub directive: IncludeDirective,
    /// `true` for `#include_next`.
    pub is_next: bool,
    /// Byte offset of the start of the directive line.
    pub start: u32,
    /// Byte offset one past the end of the directive line.
    pub end: u32,
}

/// A `#define` and the byte range of its logical line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefineEntry {
    /// The parsed macro definition.
    pub definition: MacroDefinition,
    /// Byte offset of the start of the directive line.
    pub start: u32,
    /// Byte offset one past the end of the directive line.
    pub end: u32,
}

/// Everything the graph builder needs from one file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileDirectives {
    /// Include and import directives in file order.
    pub includes: Vec<IncludeEntry>,
    /// Macro definitions in file order.
    pub defines: Vec<DefineEntry>,
}

/// Extracts include and define directives from `source`.
///
/// Invalid UTF-8 is tolerated; directive text is decoded lossily.
pub fn extract(source: &[u8]) -> FileDirectives {
    let mut scanner = Scanner { source, pos: 0 };
    let mut out = FileDirectives::default();
    while let Some(line) = scanner.next_line() {
        parse_line(&line, &mut out);
    }
    out
}

struct LogicalLine {
    text: Vec<u8>,
    start: u32,
    end: u32,
}

struct Scanner<'a> {
    source: &'a [u8],
    pos: usize,
}

impl Scanner<'_> {
    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Length of a backslash continuation at the current position, or 0.
    fn continuation_len(&self) -> usize {
        if self.peek() != b'\\' {
            return 0;
        }
        match (self.peek_at(1), self.peek_at(2)) {
            (b'\n', _) => 2,
            (b'\r', b'\n') => 3,
            _ => 0,
        }
    }

    fn next_line(&mut self) -> Option<LogicalLine> {
        if self.at_end() {
            return None;
        }
        let start = self.pos;
        let mut text = Vec::new();
        while !self.at_end() {
            let cont = self.continuation_len();
            if cont > 0 {
                self.pos += cont;
                continue;
            }
            match self.peek() {
                b'\n' => break,
                b'\r' => self.pos += 1,
                b'/' if self.peek_at(1) == b'/' => self.skip_line_comment(),
                b'/' if self.peek_at(1) == b'*' => {
                    self.skip_block_comment();
                    text.push(b' ');
                }
                quote @ (b'"' | b'\'') => self.copy_literal(quote, quote, &mut text),
                b'<' if is_include_prefix(&text) => self.copy_literal(b'<', b'>', &mut text),
                b => {
                    text.push(b);
                    self.pos += 1;
                }
            }
        }
        let end = self.pos;
        if self.peek() == b'\n' {
            self.pos += 1;
        }
        Some(LogicalLine {
            text,
            start: start as u32,
            end: end as u32,
        })
    }

    fn skip_line_comment(&mut self) {
        while !self.at_end() && self.peek() != b'\n' {
            let cont = self.continuation_len();
            self.pos += cont.max(1);
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while !self.at_end() {
            if self.peek() == b'*' && self.peek_at(1) == b'/' {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    /// Copies a delimited literal through its closing byte. An unterminated
    /// literal stops at the end of the line.
    fn copy_literal(&mut self, open: u8, close: u8, text: &mut Vec<u8>) {
        text.push(open);
        self.pos += 1;
        while !self.at_end() {
            let cont = self.continuation_len();
            if cont > 0 {
                self.pos += cont;
                continue;
            }
            let b = self.peek();
            if b == b'\n' {
                return;
            }
            if b == b'\\' && close != b'>' {
                text.push(b);
                self.pos += 1;
                if !self.at_end() && self.peek() != b'\n' {
                    text.push(self.peek());
                    self.pos += 1;
                }
                continue;
            }
            text.push(b);
            self.pos += 1;
            if b == close {
                return;
            }
        }
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\x0b' | b'\x0c')
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !is_space(*b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_space(*b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Splits a directive line into its keyword and the remaining text.
fn directive_keyword(text: &[u8]) -> Option<(&[u8], &[u8])> {
    let text = trim(text);
    let rest = text.strip_prefix(b"#")?;
    let rest = &rest[rest.iter().position(|b| !is_space(*b)).unwrap_or(rest.len())..];
    let len = rest.iter().position(|b| !is_ident_char(*b)).unwrap_or(rest.len());
    Some((&rest[..len], &rest[len..]))
}

fn is_include_keyword(keyword: &[u8]) -> bool {
    matches!(keyword, b"include" | b"include_next" | b"import")
}

/// `true` when `text` so far is `#include` (or a sibling) plus optional space,
/// so that a following `<` opens a header name.
fn is_include_prefix(text: &[u8]) -> bool {
    match directive_keyword(text) {
        Some((keyword, rest)) => is_include_keyword(keyword) && trim(rest).is_empty(),
        None => false,
    }
}

fn parse_line(line: &LogicalLine, out: &mut FileDirectives) {
    let Some((keyword, rest)) = directive_keyword(&line.text) else {
        return;
    };
    match keyword {
        b"include" | b"include_next" | b"import" => {
            let is_import = keyword == b"import";
            let arg = include_argument(trim(rest));
            if arg.is_empty() {
                return;
            }
            if let Ok(directive) = classify(&String::from_utf8_lossy(arg), is_import) {
                out.includes.push(IncludeEntry {
                    directive,
                    is_next: keyword == b"include_next",
                    start: line.start,
                    end: line.end,
                });
            }
        }
        b"define" => {
            if let Some(definition) = parse_define(rest) {
                out.defines.push(DefineEntry {
                    definition,
                    start: line.start,
                    end: line.end,
                });
            }
        }
        _ => {}
    }
}

fn include_argument(rest: &[u8]) -> &[u8] {
    let close = match rest.first() {
        Some(b'<') => rest.iter().position(|b| *b == b'>'),
        Some(b'"') => rest[1..].iter().position(|b| *b == b'"').map(|i| i + 1),
        _ => None,
    };
    match close {
        Some(i) => &rest[..=i],
        None => rest,
    }
}

fn parse_define(rest: &[u8]) -> Option<MacroDefinition> {
    let rest = &rest[rest.iter().position(|b| !is_space(*b)).unwrap_or(rest.len())..];
    if !rest.first().copied().is_some_and(is_ident_start) {
        return None;
    }
    let len = rest.iter().position(|b| !is_ident_char(*b)).unwrap_or(rest.len());
    let name = String::from_utf8_lossy(&rest[..len]).into_owned();
    let after = &rest[len..];

    if after.first() == Some(&b'(') {
        let close = after.iter().position(|b| *b == b')')?;
        let inner = trim(&after[1..close]);
        let parameters = if inner.is_empty() {
            Vec::new()
        } else {
            inner
                .split(|b| *b == b',')
                .map(|p| String::from_utf8_lossy(trim(p)).into_owned())
                .collect()
        };
        let replacement = String::from_utf8_lossy(trim(&after[close + 1..])).into_owned();
        return Some(MacroDefinition::function(name, parameters, replacement));
    }

    let replacement = String::from_utf8_lossy(trim(after)).into_owned();
    Some(MacroDefinition::object(name, replacement))
}
