//! Shared pipeline helpers for CLI commands.
//!
//! Locates the project, layers command-line flags over `hdrdep.toml`, runs
//! the graph builder and renders diagnostics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hdrdep_config::{
    load_config, load_config_from_str, parse_define, EngineSettings, ProjectConfig,
    TrackedModule, CONFIG_FILE,
};
use hdrdep_diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticRenderer, DiagnosticSink, JsonRenderer, Severity,
    TerminalRenderer,
};
use hdrdep_graph::{
    discover_sources, report_issues, BuildOutcome, GraphBuilder, GraphError, SearchPaths,
};
use hdrdep_source::{normalize_path, FileSystem, SourceDb, Span};

use crate::{EngineArgs, GlobalArgs, ReportFormat};

/// Version recorded in snapshots; a snapshot from another version is ignored.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A project directory and its parsed configuration.
#[derive(Debug)]
pub struct Project {
    /// Directory that relative configuration paths are resolved against.
    pub dir: PathBuf,
    /// Parsed `hdrdep.toml`, or the defaults when there is none.
    pub config: ProjectConfig,
}

/// Walks up from `start` looking for the nearest directory containing
/// `hdrdep.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Loads the project selected by the global flags.
///
/// `--config` may name a configuration file or the directory holding one.
/// Without it the nearest `hdrdep.toml` above the current directory is used;
/// if there is none, the current directory with default settings.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    if let Some(ref config_path) = global.config {
        let path = normalize_path(&cwd.join(config_path));
        if path.is_file() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            let dir = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
            return Ok(Project {
                dir,
                config: load_config_from_str(&content)?,
            });
        }
        return Ok(Project {
            config: load_config(&path)?,
            dir: path,
        });
    }
    match find_project_root(&cwd) {
        Some(dir) => Ok(Project {
            config: load_config(&dir)?,
            dir,
        }),
        None => Ok(Project {
            dir: cwd,
            config: ProjectConfig::default(),
        }),
    }
}

/// Creates the tracked module for `project` and registers one configuration
/// action per command-line override.
///
/// Command-line paths are relative to the current directory. Search
/// directories given on the command line are searched before the configured
/// ones.
pub fn open_module(
    project: &Project,
    args: &EngineArgs,
    strict: bool,
) -> Result<TrackedModule, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let absolute = |paths: &[PathBuf]| -> Vec<PathBuf> {
        paths.iter().map(|p| normalize_path(&cwd.join(p))).collect()
    };

    if args.jobs == Some(0) {
        return Err("--jobs must be at least 1".into());
    }
    let defines = args
        .defines
        .iter()
        .map(|d| parse_define(d.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let base = EngineSettings::from_config(&project.config, &project.dir);
    let module = TrackedModule::new(&project.dir, project.config.module.name.clone(), base);

    if !args.sources.is_empty() {
        let sources = absolute(&args.sources);
        module.configure(move |s| s.source_roots = sources)?;
    }
    if !args.include_dirs.is_empty() {
        let dirs = absolute(&args.include_dirs);
        module.configure(move |s| prepend(&mut s.include_dirs, dirs))?;
    }
    if !args.quote_dirs.is_empty() {
        let dirs = absolute(&args.quote_dirs);
        module.configure(move |s| prepend(&mut s.quote_dirs, dirs))?;
    }
    if !defines.is_empty() {
        module.configure(move |s| {
            for (name, value) in defines {
                s.define(name, value);
            }
        })?;
    }
    if let Some(jobs) = args.jobs {
        module.configure(move |s| s.jobs = Some(jobs))?;
    }
    if let Some(ref dir) = args.cache_dir {
        let dir = normalize_path(&cwd.join(dir));
        module.configure(move |s| s.cache_dir = dir)?;
    }
    if strict {
        module.configure(|s| s.strict = true)?;
    }
    Ok(module)
}

fn prepend(existing: &mut Vec<PathBuf>, mut front: Vec<PathBuf>) {
    front.retain(|dir| !existing.contains(dir));
    front.append(existing);
    *existing = front;
}

/// The result of one engine run.
pub struct EngineRun {
    /// The build, or `None` if a source could not be read.
    pub outcome: Option<BuildOutcome>,
    /// Files referenced by diagnostics.
    pub source_db: SourceDb,
    /// Every diagnostic of the run.
    pub sink: DiagnosticSink,
}

/// Discovers the translation units of `settings` and builds their graph.
///
/// An unreadable source root or translation unit is reported as an error
/// diagnostic rather than an `Err`.
pub fn run_engine(
    settings: &EngineSettings,
    fs: Arc<dyn FileSystem>,
) -> Result<EngineRun, Box<dyn std::error::Error>> {
    let mut source_db = SourceDb::new();
    let sink = DiagnosticSink::new();

    let built = discover_sources(fs.as_ref(), &settings.source_roots, &settings.extensions)
        .and_then(|roots| {
            tracing::info!(units = roots.len(), "building include graph");
            GraphBuilder::new(
                Arc::clone(&fs),
                SearchPaths::new(settings.quote_dirs.clone(), settings.include_dirs.clone()),
            )
            .with_predefined(settings.defines.iter().cloned())
            .with_jobs(settings.jobs)
            .build(&roots)
        });

    let outcome = match built {
        Ok(outcome) => {
            tracing::info!(
                files = outcome.graph.len(),
                parsed = outcome.parse_count,
                "include graph built"
            );
            report_issues(&outcome, fs.as_ref(), &mut source_db, &sink, settings.strict);
            Some(outcome)
        }
        Err(GraphError::Io { path, source }) => {
            sink.emit(
                Diagnostic::error(
                    DiagnosticCode::UNREADABLE_SOURCE,
                    format!("cannot read {}: {source}", path.display()),
                    Span::DUMMY,
                )
                .with_help("check the source roots in hdrdep.toml or on the command line"),
            );
            None
        }
        Err(e) => return Err(e.into()),
    };

    Ok(EngineRun {
        outcome,
        source_db,
        sink,
    })
}

/// Renders all diagnostics to stderr. Returns `(errors, warnings)`.
pub fn render_diagnostics(
    run: &EngineRun,
    format: ReportFormat,
    color: bool,
) -> (usize, usize) {
    let diagnostics = run.sink.diagnostics();
    let renderer: Box<dyn DiagnosticRenderer> = match format {
        ReportFormat::Text => Box::new(TerminalRenderer::new(color)),
        ReportFormat::Json => Box::new(JsonRenderer),
    };
    for diag in &diagnostics {
        eprint!("{}", renderer.render(diag, &run.source_db));
    }
    (run.sink.error_count(), run.sink.count(Severity::Warning))
}

/// Shows `path` relative to `base` when it lies under it.
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
