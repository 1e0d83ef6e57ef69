//! `hdrdep graph`: prints the include graph without touching the snapshot.

use std::path::Path;
use std::sync::Arc;

use hdrdep_graph::{IncludeGraph, Resolution};
use hdrdep_source::DiskFileSystem;

use crate::pipeline::{display_path, load_project, open_module, render_diagnostics, run_engine};
use crate::{GlobalArgs, GraphArgs, ReportFormat};

/// Runs the `hdrdep graph` command.
pub fn run(args: &GraphArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let module = open_module(&project, &args.engine, false)?;
    let settings = module.settings();

    let run = run_engine(&settings, Arc::new(DiskFileSystem))?;
    let (errors, _) = render_diagnostics(&run, ReportFormat::Text, global.color);
    let Some(outcome) = run.outcome.as_ref() else {
        return Ok(1);
    };

    if args.dot {
        print!("{}", outcome.graph.to_dot());
    } else {
        print!("{}", listing(&outcome.graph, &project.dir));
    }
    Ok(if errors > 0 { 1 } else { 0 })
}

/// Every file in path order with its includes and where they lead.
fn listing(graph: &IncludeGraph, base: &Path) -> String {
    let mut out = String::new();
    for record in graph.records() {
        let marker = if record.is_root { " [unit]" } else { "" };
        out.push_str(&format!("{}{marker}\n", display_path(&record.path, base)));
        for include in &record.resolved {
            let target = match include.resolution {
                Resolution::Unresolved => "(unresolved)".to_string(),
                Resolution::Exact | Resolution::Ambiguous => include
                    .candidates
                    .iter()
                    .map(|c| display_path(c, base))
                    .collect::<Vec<_>>()
                    .join(" | "),
            };
            let keyword = if include.directive.is_import() {
                "#import"
            } else {
                "#include"
            };
            out.push_str(&format!(
                "  {keyword} {} -> {target}\n",
                include.directive.to_source_text()
            ));
        }
    }
    out
}
