//! Configuration types deserialized from `hdrdep.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Default source file extensions tracked as translation units.
pub const DEFAULT_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "c++", "m", "mm"];

/// Default cache directory, relative to the project directory.
pub const DEFAULT_CACHE_DIR: &str = ".hdrdep-cache";

/// The top-level project configuration parsed from `hdrdep.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    /// Module identity and tracked source roots.
    #[serde(default)]
    pub module: ModuleMeta,
    /// Include search directories.
    #[serde(default)]
    pub search: SearchConfig,
    /// Predefined macros visible to every translation unit.
    #[serde(default)]
    pub macros: MacroConfig,
    /// Build behaviour (strict mode, cache location, parallelism).
    #[serde(default)]
    pub build: BuildConfig,
}

/// Module identity and source roots.
#[derive(Debug, Deserialize)]
pub struct ModuleMeta {
    /// Module name. Defaults to the project directory name when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Source roots (files or directories), relative to the project directory.
    #[serde(default = "default_sources", deserialize_with = "deserialize_string_or_vec")]
    pub sources: Vec<String>,
    /// File extensions (without the dot) treated as translation units.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ModuleMeta {
    fn default() -> Self {
        Self {
            name: None,
            sources: default_sources(),
            extensions: default_extensions(),
        }
    }
}

/// Ordered include search directories.
///
/// Quoted includes search the including file's directory, then `quote`, then
/// `include`. Angled includes search `include` only.
#[derive(Debug, Default, Deserialize)]
pub struct SearchConfig {
    /// Directories searched by both quoted and angled includes.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub include: Vec<String>,
    /// Directories searched by quoted includes only.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub quote: Vec<String>,
}

/// Predefined macros, as if passed with `-D NAME=VALUE`.
#[derive(Debug, Default, Deserialize)]
pub struct MacroConfig {
    /// Macro name to replacement text.
    #[serde(default)]
    pub defines: BTreeMap<String, String>,
}

/// Build behaviour settings.
#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    /// Surface unresolvable includes as build-blocking errors.
    #[serde(default)]
    pub strict: bool,
    /// Snapshot directory, relative to the project directory.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Worker thread count. `None` uses one worker per CPU.
    #[serde(default)]
    pub jobs: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            strict: false,
            cache_dir: default_cache_dir(),
            jobs: None,
        }
    }
}

fn default_sources() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `include = "include"` as well as `include = ["include", "vendor"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
