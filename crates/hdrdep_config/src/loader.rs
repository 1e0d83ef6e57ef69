//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the configuration file in a project directory.
pub const CONFIG_FILE: &str = "hdrdep.toml";

/// Loads and validates `<project_dir>/hdrdep.toml`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE))?;
    load_config_from_str(&content)
}

/// Loads `<project_dir>/hdrdep.toml` if it exists, otherwise returns the
/// default configuration.
pub fn load_config_or_default(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    if project_dir.join(CONFIG_FILE).is_file() {
        load_config(project_dir)
    } else {
        Ok(ProjectConfig::default())
    }
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.module.name.as_deref().is_some_and(str::is_empty) {
        return Err(ConfigError::MissingField("module.name".to_string()));
    }
    if config.module.sources.is_empty() || config.module.sources.iter().any(String::is_empty) {
        return Err(ConfigError::MissingField("module.sources".to_string()));
    }
    if config.module.extensions.is_empty() {
        return Err(ConfigError::MissingField("module.extensions".to_string()));
    }
    if config.build.cache_dir.is_empty() {
        return Err(ConfigError::MissingField("build.cache_dir".to_string()));
    }
    if config.build.jobs == Some(0) {
        return Err(ConfigError::ValidationError(
            "build.jobs must be at least 1".to_string(),
        ));
    }
    for name in config.macros.defines.keys() {
        if !is_identifier(name) {
            return Err(ConfigError::ValidationError(format!(
                "'{name}' is not a valid macro name"
            )));
        }
    }
    Ok(())
}

/// Returns `true` if `name` is a valid C identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
[module]
name = "engine"
sources = ["src", "tools/gen.c"]
extensions = ["c", "m"]

[search]
include = ["include", "/usr/include"]
quote = ["generated"]

[macros.defines]
PLATFORM_HEADER = '"platform/linux.h"'

[build]
strict = true
cache_dir = "build/.deps"
jobs = 4
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.module.name.as_deref(), Some("engine"));
        assert_eq!(config.module.sources.len(), 2);
        assert_eq!(config.search.include, vec!["include", "/usr/include"]);
        assert_eq!(config.search.quote, vec!["generated"]);
        assert_eq!(
            config.macros.defines["PLATFORM_HEADER"],
            "\"platform/linux.h\""
        );
        assert!(config.build.strict);
        assert_eq!(config.build.jobs, Some(4));
    }

    #[test]
    fn empty_name_errors() {
        let err = load_config_from_str("[module]\nname = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn empty_sources_errors() {
        let err = load_config_from_str("[module]\nsources = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn zero_jobs_errors() {
        let err = load_config_from_str("[build]\njobs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn bad_macro_name_errors() {
        let err = load_config_from_str("[macros.defines]\n\"1BAD\" = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path()).unwrap();
        assert_eq!(config.module.sources, vec!["src"]);
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[build]\nstrict = true\n").unwrap();
        assert!(load_config(dir.path()).unwrap().build.strict);
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("FOO_HEADER"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("A-B"));
    }
}
