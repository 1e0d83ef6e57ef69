//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;
use hdrdep_source::SourceDb;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// Renders diagnostics in a compiler-style terminal format.
///
/// Produces output like:
/// ```text
/// warning[W101]: cannot find 'config.h' on any search path
///   --> src/main.c:3:10
///   |
/// 3 | #include "config.h"
///   |          ^^^^^^^^^^ not found
///   |
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in the header line.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, diag: &Diagnostic) -> String {
        let head = format!("{}[{}]", diag.severity, diag.code);
        if !self.color {
            return head;
        }
        let ansi = match diag.severity {
            crate::Severity::Error => "31",
            crate::Severity::Warning => "33",
            crate::Severity::Note => "36",
        };
        format!("\x1b[1;{ansi}m{head}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}: {}\n", self.header(diag), diag.message));

        if !diag.primary_span.is_dummy() {
            let resolved = source_db.resolve_span(diag.primary_span);
            out.push_str(&format!("  --> {resolved}\n"));

            let file = source_db.get_file(diag.primary_span.file);
            let (line, col) = file.line_col(diag.primary_span.start);
            let line_num = format!("{line}");
            let padding = " ".repeat(line_num.len());
            let line_content = get_source_line(&file.content, diag.primary_span.start);

            out.push_str(&format!("{padding} |\n"));
            out.push_str(&format!("{line_num} | {line_content}\n"));

            let span_len = diag.primary_span.len().max(1) as usize;
            let carets = "^".repeat(span_len);
            let col_padding = " ".repeat((col as usize).saturating_sub(1));
            let primary_msg = diag
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
                .map(|l| format!(" {}", l.message))
                .unwrap_or_default();

            out.push_str(&format!("{padding} | {col_padding}{carets}{primary_msg}\n"));
        }

        for label in diag.labels.iter().filter(|l| l.style == LabelStyle::Secondary) {
            if label.span.is_dummy() {
                continue;
            }
            let resolved = source_db.resolve_span(label.span);
            out.push_str(&format!("   - {resolved}: {}\n", label.message));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

/// Renders each diagnostic as one JSON object per line.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let location = (!diag.primary_span.is_dummy()).then(|| {
            let resolved = source_db.resolve_span(diag.primary_span);
            serde_json::json!({
                "file": resolved.file_path.display().to_string(),
                "line": resolved.start_line,
                "column": resolved.start_col,
            })
        });
        let value = serde_json::json!({
            "severity": diag.severity.to_string(),
            "code": diag.code.to_string(),
            "message": diag.message,
            "location": location,
            "notes": diag.notes,
            "help": diag.help,
        });
        format!("{value}\n")
    }
}

/// Extracts the line of source code containing the given byte offset.
///
/// The search runs over bytes, so an offset inside a multi-byte character
/// still yields its whole line.
fn get_source_line(content: &str, byte_offset: u32) -> &str {
    let bytes = content.as_bytes();
    let offset = (byte_offset as usize).min(bytes.len());
    let start = bytes[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    let end = bytes[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |pos| offset + pos);
    content.get(start..end).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;
    use crate::label::Label;
    use hdrdep_source::Span;

    #[test]
    fn render_warning_with_span() {
        let mut source_db = SourceDb::new();
        let file_id = source_db.add_source("main.c", "int x;\n#include \"config.h\"\n");
        let span = Span::new(file_id, 16, 26);
        let diag = Diagnostic::warning(
            DiagnosticCode::UNRESOLVED_INCLUDE,
            "cannot find 'config.h' on any search path",
            span,
        )
        .with_label(Label::primary(span, "not found"));

        let output = TerminalRenderer::new(false).render(&diag, &source_db);

        assert!(output.contains("warning[W101]: cannot find 'config.h'"));
        assert!(output.contains("--> main.c:2:10"));
        assert!(output.contains("#include \"config.h\""));
        assert!(output.contains("^^^^^^^^^^ not found"));
    }

    #[test]
    fn source_line_inside_multibyte_char() {
        let content = "// \u{e9}t\u{e9}\n#include <x.h>\n";
        assert_eq!(get_source_line(content, 4), "// \u{e9}t\u{e9}");
        assert_eq!(get_source_line(content, 400), "");
        assert_eq!(get_source_line(content, 10), "#include <x.h>");
    }

    #[test]
    fn render_note_without_span() {
        let source_db = SourceDb::new();
        let diag = Diagnostic::note(DiagnosticCode::INCLUDE_CYCLE, "include cycle", Span::DUMMY)
            .with_note("a.h -> b.h -> a.h");

        let output = TerminalRenderer::new(false).render(&diag, &source_db);

        assert!(output.contains("note[N201]: include cycle"));
        assert!(output.contains("= note: a.h -> b.h -> a.h"));
        assert!(!output.contains("-->"));
    }

    #[test]
    fn colored_header_wraps_in_ansi() {
        let source_db = SourceDb::new();
        let diag = Diagnostic::error(DiagnosticCode::UNREADABLE_SOURCE, "boom", Span::DUMMY);
        let output = TerminalRenderer::new(true).render(&diag, &source_db);
        assert!(output.starts_with("\x1b[1;31merror[E102]"));
    }

    #[test]
    fn json_render_has_location() {
        let mut source_db = SourceDb::new();
        let file_id = source_db.add_source("main.c", "#include MISSING\n");
        let diag = Diagnostic::warning(
            DiagnosticCode::UNRESOLVED_MACRO_INCLUDE,
            "cannot reduce 'MISSING'",
            Span::new(file_id, 9, 16),
        );
        let output = JsonRenderer.render(&diag, &source_db);
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["code"], "W103");
        assert_eq!(value["location"]["line"], 1);
        assert_eq!(value["location"]["column"], 10);
    }
}
