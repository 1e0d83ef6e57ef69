//! hdrdep CLI, the command-line front end of the include-dependency engine.
//!
//! Provides `hdrdep check` for computing the translation units that need
//! recompiling, `hdrdep graph` for inspecting the include graph, and
//! `hdrdep clean` for discarding the incremental snapshot.

#![warn(missing_docs)]

mod check;
mod clean;
mod graph;
mod logging;
mod pipeline;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// hdrdep: incremental include-dependency tracking for C, C++ and Objective-C.
#[derive(Parser, Debug)]
#[command(name = "hdrdep", version, about = "Incremental native include-dependency engine")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `hdrdep.toml`, or to the directory holding it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the translation units that must be recompiled, then record this
    /// build.
    Check(CheckArgs),
    /// Print the include graph.
    Graph(GraphArgs),
    /// Delete the incremental snapshot.
    Clean(CleanArgs),
}

/// Engine options shared by `check` and `graph`. Each one is applied on top
/// of `hdrdep.toml`.
#[derive(Args, Debug, Default)]
pub struct EngineArgs {
    /// Source roots (files or directories). Replaces `[module] sources`.
    pub sources: Vec<PathBuf>,

    /// Add a directory searched by quoted and angled includes.
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    pub include_dirs: Vec<PathBuf>,

    /// Add a directory searched by quoted includes only.
    #[arg(long = "iquote", value_name = "DIR")]
    pub quote_dirs: Vec<PathBuf>,

    /// Predefine a macro (`NAME` or `NAME=VALUE`).
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
    pub defines: Vec<String>,

    /// Number of worker threads (default: one per CPU).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Directory holding the incremental snapshot.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Arguments for the `hdrdep check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Engine options.
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Treat unresolved includes as errors; nothing is recorded on error.
    #[arg(long)]
    pub strict: bool,

    /// Compute the stale set without recording this build.
    #[arg(long)]
    pub no_commit: bool,

    /// Output format for the report.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `hdrdep graph` subcommand.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Engine options.
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Emit Graphviz DOT instead of the text listing.
    #[arg(long)]
    pub dot: bool,
}

/// Arguments for the `hdrdep clean` subcommand.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Directory holding the incremental snapshot.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    if let Err(e) = logging::init_logging(global.quiet, global.verbose) {
        eprintln!("warning: {e}");
    }

    let result = match cli.command {
        Command::Check(ref args) => check::run(args, &global),
        Command::Graph(ref args) => graph::run(args, &global),
        Command::Clean(ref args) => clean::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_check_default() {
        let cli = Cli::parse_from(["hdrdep", "check"]);
        match cli.command {
            Command::Check(ref args) => {
                assert!(args.engine.sources.is_empty());
                assert!(args.engine.include_dirs.is_empty());
                assert!(args.engine.jobs.is_none());
                assert!(!args.strict);
                assert!(!args.no_commit);
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn parse_check_with_args() {
        let cli = Cli::parse_from([
            "hdrdep",
            "check",
            "src/main.c",
            "lib",
            "-I",
            "include",
            "-I",
            "vendor/include",
            "--iquote",
            "gen",
            "-D",
            "DEBUG",
            "-DCONFIG_H=\"cfg.h\"",
            "--strict",
            "--jobs",
            "4",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Check(ref args) => {
                assert_eq!(
                    args.engine.sources,
                    vec![PathBuf::from("src/main.c"), PathBuf::from("lib")]
                );
                assert_eq!(
                    args.engine.include_dirs,
                    vec![PathBuf::from("include"), PathBuf::from("vendor/include")]
                );
                assert_eq!(args.engine.quote_dirs, vec![PathBuf::from("gen")]);
                assert_eq!(args.engine.defines, vec!["DEBUG", "CONFIG_H=\"cfg.h\""]);
                assert_eq!(args.engine.jobs, Some(4));
                assert!(args.strict);
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn parse_graph_dot() {
        let cli = Cli::parse_from(["hdrdep", "graph", "--dot", "-I", "include"]);
        match cli.command {
            Command::Graph(ref args) => {
                assert!(args.dot);
                assert_eq!(args.engine.include_dirs, vec![PathBuf::from("include")]);
            }
            _ => panic!("expected Graph command"),
        }
    }

    #[test]
    fn parse_clean_cache_dir() {
        let cli = Cli::parse_from(["hdrdep", "clean", "--cache-dir", "/tmp/c"]);
        match cli.command {
            Command::Clean(ref args) => {
                assert_eq!(args.cache_dir, Some(PathBuf::from("/tmp/c")));
            }
            _ => panic!("expected Clean command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["hdrdep", "--quiet", "--color", "never", "check"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_global_flag_after_subcommand() {
        let cli = Cli::parse_from(["hdrdep", "graph", "--verbose", "--config", "proj/hdrdep.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("proj/hdrdep.toml"));
    }

    #[test]
    fn verify_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
