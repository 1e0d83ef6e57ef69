//! Turns build results into diagnostics.

use crate::builder::{BuildOutcome, IncludeIssue};
use crate::graph::Resolution;
use hdrdep_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Label};
use hdrdep_scan::IncludeKind;
use hdrdep_source::{FileSystem, SourceDb, Span};

/// Emits one diagnostic per ambiguous or unresolved include and one note per
/// include cycle.
///
/// Files with issues are loaded into `source_db` so the diagnostics point at
/// the directive. In `strict` mode every unresolved include is an error.
pub fn report_issues(
    outcome: &BuildOutcome,
    fs: &dyn FileSystem,
    source_db: &mut SourceDb,
    sink: &DiagnosticSink,
    strict: bool,
) {
    for issue in outcome.unresolved_report() {
        let span = source_db
            .load_file(fs, &issue.file)
            .map(|id| Span::new(id, issue.start, issue.end))
            .unwrap_or(Span::DUMMY);
        if let Some(diag) = issue_diagnostic(&issue, span, strict) {
            sink.emit(diag);
        }
    }

    for cycle in outcome.graph.cycles() {
        let chain: Vec<String> = cycle.iter().map(|p| p.display().to_string()).collect();
        let diag = Diagnostic::note(
            DiagnosticCode::INCLUDE_CYCLE,
            format!("include cycle through {} file(s)", cycle.len()),
            Span::DUMMY,
        )
        .with_note(format!("cycle: {}", chain.join(" <-> ")))
        .with_note("every file on the cycle depends on every other");
        sink.emit(diag);
    }
}

fn issue_diagnostic(issue: &IncludeIssue, span: Span, strict: bool) -> Option<Diagnostic> {
    let directive = &issue.directive;
    let diag = match issue.resolution {
        Resolution::Unresolved if strict => Diagnostic::error(
            DiagnosticCode::STRICT_UNRESOLVED_INCLUDE,
            format!("cannot resolve include {}", directive.to_source_text()),
            span,
        )
        .with_label(Label::primary(span, "unresolved"))
        .with_note("strict mode does not allow unresolved includes"),
        Resolution::Unresolved if directive.kind() == IncludeKind::Macro => Diagnostic::warning(
            DiagnosticCode::UNRESOLVED_MACRO_INCLUDE,
            format!(
                "macro include '{}' could not be reduced to a header name",
                directive.value()
            ),
            span,
        )
        .with_label(Label::primary(span, "irreducible"))
        .with_note("the unit now depends on every visible macro definition")
        .with_note("it is rebuilt on every run until the include resolves"),
        Resolution::Unresolved => Diagnostic::warning(
            DiagnosticCode::UNRESOLVED_INCLUDE,
            format!("cannot find '{}' on any search path", directive.value()),
            span,
        )
        .with_label(Label::primary(span, "not found"))
        .with_note("the unit is rebuilt on every run until the include resolves")
        .with_help("add its directory with -I, --iquote or [search] in hdrdep.toml"),
        Resolution::Ambiguous => {
            let mut diag = Diagnostic::warning(
                DiagnosticCode::AMBIGUOUS_MACRO_INCLUDE,
                format!(
                    "macro include '{}' may name {} headers",
                    directive.value(),
                    issue.candidates.len()
                ),
                span,
            )
            .with_label(Label::primary(span, "ambiguous"));
            for candidate in &issue.candidates {
                diag = diag.with_note(format!("candidate: {}", candidate.display()));
            }
            diag.with_note("every candidate is tracked as a dependency")
        }
        Resolution::Exact => return None,
    };
    Some(diag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::search::SearchPaths;
    use hdrdep_diagnostics::{DiagnosticRenderer, Severity, TerminalRenderer};
    use hdrdep_source::MemoryFileSystem;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn run(strict: bool) -> (Vec<Diagnostic>, SourceDb) {
        let fs = MemoryFileSystem::new();
        fs.add_file(
            "/p/s.c",
            "#include \"a.h\"\n#include \"b.h\"\n#include <missing.h>\n#include NOPE\n#include PICK\n",
        );
        fs.add_file("/p/a.h", "#define PICK \"x.h\"\n#include \"b.h\"\n");
        fs.add_file("/p/b.h", "#define PICK \"y.h\"\n#include \"a.h\"\n");
        fs.add_file("/p/x.h", "");
        fs.add_file("/p/y.h", "");
        let outcome = GraphBuilder::new(Arc::new(fs.clone()), SearchPaths::default())
            .build(&[PathBuf::from("/p/s.c")])
            .unwrap();
        let sink = DiagnosticSink::new();
        let mut db = SourceDb::new();
        report_issues(&outcome, &fs, &mut db, &sink, strict);
        (sink.take_all(), db)
    }

    #[test]
    fn lenient_mode_warns() {
        let (diags, _) = run(false);
        let codes: Vec<String> = diags.iter().map(|d| d.code.to_string()).collect();
        assert_eq!(codes, vec!["W101", "W103", "W102", "N201"]);
        assert!(diags.iter().all(|d| !d.severity.is_error()));
    }

    #[test]
    fn strict_mode_errors_on_unresolved() {
        let (diags, _) = run(true);
        let errors: Vec<_> = diags
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|d| d.code == DiagnosticCode::STRICT_UNRESOLVED_INCLUDE));
        assert!(errors[0].message.contains("<missing.h>"));
    }

    #[test]
    fn spans_point_at_the_directive() {
        let (diags, db) = run(false);
        let missing = &diags[0];
        assert_eq!(db.snippet(missing.primary_span), "#include <missing.h>");
        let resolved = db.resolve_span(missing.primary_span);
        assert_eq!(resolved.start_line, 3);
    }

    #[test]
    fn ambiguous_lists_candidates() {
        let (diags, _) = run(false);
        let ambiguous = diags
            .iter()
            .find(|d| d.code == DiagnosticCode::AMBIGUOUS_MACRO_INCLUDE)
            .unwrap();
        assert!(ambiguous.notes.iter().any(|n| n == "candidate: /p/x.h"));
        assert!(ambiguous.notes.iter().any(|n| n == "candidate: /p/y.h"));
    }

    #[test]
    fn latin1_source_renders() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/p/old.c", b"/* \xe9t\xe9 */\n#include <missing.h>\n".to_vec());
        let outcome = GraphBuilder::new(Arc::new(fs.clone()), SearchPaths::default())
            .build(&[PathBuf::from("/p/old.c")])
            .unwrap();
        let sink = DiagnosticSink::new();
        let mut db = SourceDb::new();
        report_issues(&outcome, &fs, &mut db, &sink, false);

        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(db.snippet(diags[0].primary_span), "#include <missing.h>");
        let output = TerminalRenderer::new(false).render(&diags[0], &db);
        assert!(output.contains("--> /p/old.c:2:1"), "{output}");
        assert!(output.contains("2 | #include <missing.h>"), "{output}");
    }
}
