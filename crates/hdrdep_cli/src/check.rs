//! `hdrdep check`: the incremental rebuild query.
//!
//! 1. Locate the project and layer flags over `hdrdep.toml`
//! 2. Discover translation units and build the include graph
//! 3. Render diagnostics
//! 4. Compare the graph against the previous snapshot and print the stale set
//! 5. Record the graph as the new snapshot, unless there were errors

use std::path::Path;
use std::sync::Arc;

use hdrdep_cache::{IncrementalStore, StaleReason, StaleSet};
use hdrdep_source::DiskFileSystem;
use serde::Serialize;

use crate::pipeline::{
    display_path, load_project, open_module, render_diagnostics, run_engine, ENGINE_VERSION,
};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// JSON form of a check result.
#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    module: &'a str,
    cold_start: bool,
    stale: Vec<StaleEntry<'a>>,
    removed: Vec<String>,
    committed: bool,
}

#[derive(Debug, Serialize)]
struct StaleEntry<'a> {
    path: String,
    reasons: &'a [StaleReason],
}

/// Runs the `hdrdep check` command.
///
/// Returns exit code 0 on success and 1 if any error diagnostic was emitted,
/// in which case the snapshot is left untouched.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let module = open_module(&project, &args.engine, args.strict)?;
    let settings = module.settings();

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!("   Checking {} ({})", module.name(), project.dir.display());
    }

    let run = run_engine(&settings, Arc::new(DiskFileSystem))?;
    let (errors, warnings) = render_diagnostics(&run, args.format, global.color);

    let Some(outcome) = run.outcome.as_ref() else {
        return Ok(1);
    };

    let mut store = IncrementalStore::load(&settings.cache_dir, module.name(), ENGINE_VERSION);
    let stale = store.stale_files(&outcome.graph);
    let cold_start = store.is_cold();

    let commit = errors == 0 && !args.no_commit;
    if commit {
        store.commit(&outcome.graph)?;
    } else if errors > 0 && !global.quiet {
        eprintln!("   Snapshot not updated: {errors} error(s)");
    }

    match args.format {
        ReportFormat::Text => {
            print!("{}", text_report(&stale, &project.dir));
            if !global.quiet {
                eprintln!(
                    "   Result: {} stale, {} removed, {} error(s), {} warning(s)",
                    stale.len(),
                    stale.removed.len(),
                    errors,
                    warnings
                );
            }
        }
        ReportFormat::Json => {
            let report = CheckReport {
                module: module.name(),
                cold_start,
                stale: stale
                    .stale
                    .iter()
                    .map(|(path, reasons)| StaleEntry {
                        path: display_path(path, &project.dir),
                        reasons,
                    })
                    .collect(),
                removed: stale
                    .removed
                    .iter()
                    .map(|p| display_path(p, &project.dir))
                    .collect(),
                committed: commit,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(if errors > 0 { 1 } else { 0 })
}

/// One line per stale unit with its reasons, then one per removed unit.
fn text_report(stale: &StaleSet, base: &Path) -> String {
    let mut out = String::new();
    for (path, reasons) in &stale.stale {
        let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();
        out.push_str(&format!("{}: {}\n", display_path(path, base), reasons.join(", ")));
    }
    for path in &stale.removed {
        out.push_str(&format!("{}: removed\n", display_path(path, base)));
    }
    out
}
