//! Parsing and validation of `hdrdep.toml`, module identity, and frozen
//! engine settings.
//!
//! A project configuration is read into a [`ProjectConfig`], resolved into
//! absolute [`EngineSettings`], and owned by a [`TrackedModule`] which layers
//! further configuration actions (for example from command-line flags) on top
//! before freezing them.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod module;
pub mod settings;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default, CONFIG_FILE};
pub use module::{SettingsAction, TrackedModule};
pub use settings::{parse_define, EngineSettings};
pub use types::*;
