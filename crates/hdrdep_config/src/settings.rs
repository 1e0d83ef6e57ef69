//! Resolved engine settings: the configuration with paths made absolute.

use crate::error::ConfigError;
use crate::loader::is_identifier;
use crate::types::{ProjectConfig, DEFAULT_CACHE_DIR, DEFAULT_EXTENSIONS};
use hdrdep_source::normalize_path;
use std::path::{Path, PathBuf};

/// Everything the dependency engine needs for one module, with every path
/// resolved against the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Tracked source roots (files or directories).
    pub source_roots: Vec<PathBuf>,
    /// Extensions (without the dot) of translation units under directory roots.
    pub extensions: Vec<String>,
    /// Directories searched by quoted and angled includes.
    pub include_dirs: Vec<PathBuf>,
    /// Directories searched by quoted includes only.
    pub quote_dirs: Vec<PathBuf>,
    /// Predefined macros in definition order.
    pub defines: Vec<(String, String)>,
    /// Whether unresolvable includes block the build.
    pub strict: bool,
    /// Directory holding the incremental snapshot.
    pub cache_dir: PathBuf,
    /// Worker thread count; `None` means one per CPU.
    pub jobs: Option<usize>,
}

impl EngineSettings {
    /// Resolves a parsed configuration against `project_dir`.
    pub fn from_config(config: &ProjectConfig, project_dir: &Path) -> Self {
        let resolve = |p: &String| normalize_path(&project_dir.join(p));
        Self {
            source_roots: config.module.sources.iter().map(resolve).collect(),
            extensions: config.module.extensions.clone(),
            include_dirs: config.search.include.iter().map(resolve).collect(),
            quote_dirs: config.search.quote.iter().map(resolve).collect(),
            defines: config
                .macros
                .defines
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            strict: config.build.strict,
            cache_dir: resolve(&config.build.cache_dir),
            jobs: config.build.jobs,
        }
    }

    /// Adds or replaces a predefined macro. A replaced macro moves to the end
    /// so that definition order reflects the last write.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.defines.retain(|(existing, _)| *existing != name);
        self.defines.push((name, value.into()));
    }

    /// Returns `true` if `path` has one of the tracked source extensions.
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            source_roots: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_dirs: Vec::new(),
            quote_dirs: Vec::new(),
            defines: Vec::new(),
            strict: false,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            jobs: None,
        }
    }
}

/// Parses a command-line style macro definition: `NAME` (value `1`) or
/// `NAME=VALUE`.
pub fn parse_define(spec: &str) -> Result<(String, String), ConfigError> {
    let (name, value) = match spec.split_once('=') {
        Some((name, value)) => (name.trim(), value.to_string()),
        None => (spec.trim(), "1".to_string()),
    };
    if !is_identifier(name) {
        return Err(ConfigError::ValidationError(format!(
            "'{name}' is not a valid macro name"
        )));
    }
    Ok((name.to_string(), value))
}
