//! Module identity and two-phase settings.
//!
//! A [`TrackedModule`] is what an orchestrating build sees of this engine: a
//! stable name and a set of source roots. Its name is resolved once, on first
//! access. Its settings are collected as an ordered list of configuration
//! actions and frozen on first use; after that, further configuration is
//! rejected with [`ConfigError::Frozen`].

use crate::error::ConfigError;
use crate::settings::EngineSettings;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// A configuration step applied to the settings when they are frozen.
pub type SettingsAction = Box<dyn FnOnce(&mut EngineSettings) + Send>;

enum SettingsPhase {
    Collecting {
        base: EngineSettings,
        actions: Vec<SettingsAction>,
    },
    Frozen(Arc<EngineSettings>),
}

/// A module whose native sources are tracked by the engine.
pub struct TrackedModule {
    project_dir: PathBuf,
    configured_name: Option<String>,
    name: OnceLock<String>,
    phase: Mutex<SettingsPhase>,
}

impl TrackedModule {
    /// Creates a module rooted at `project_dir` with `base` settings and an
    /// optional configured name.
    pub fn new(project_dir: &Path, configured_name: Option<String>, base: EngineSettings) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            configured_name,
            name: OnceLock::new(),
            phase: Mutex::new(SettingsPhase::Collecting {
                base,
                actions: Vec::new(),
            }),
        }
    }

    /// Returns the project directory.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Returns the module name, resolving it on first access.
    ///
    /// The configured name wins; otherwise the project directory's final
    /// component is used, falling back to `"root"`.
    pub fn name(&self) -> &str {
        self.name.get_or_init(|| {
            self.configured_name.clone().unwrap_or_else(|| {
                self.project_dir
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| "root".to_string())
            })
        })
    }

    /// Sets the module name explicitly. Fails once the name has been resolved.
    pub fn set_name(&self, name: impl Into<String>) -> Result<(), ConfigError> {
        self.name
            .set(name.into())
            .map_err(|_| ConfigError::Frozen("module name".to_string()))
    }

    /// Registers a configuration action. Actions run in registration order
    /// when the settings are frozen.
    pub fn configure(
        &self,
        action: impl FnOnce(&mut EngineSettings) + Send + 'static,
    ) -> Result<(), ConfigError> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        match &mut *phase {
            SettingsPhase::Collecting { actions, .. } => {
                actions.push(Box::new(action));
                Ok(())
            }
            SettingsPhase::Frozen(_) => Err(ConfigError::Frozen("module settings".to_string())),
        }
    }

    /// Returns the frozen settings, applying every registered action exactly
    /// once on the first call.
    pub fn settings(&self) -> Arc<EngineSettings> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        let placeholder = SettingsPhase::Frozen(Arc::new(EngineSettings::default()));
        let (mut base, actions) = match std::mem::replace(&mut *phase, placeholder) {
            SettingsPhase::Frozen(settings) => {
                *phase = SettingsPhase::Frozen(Arc::clone(&settings));
                return settings;
            }
            SettingsPhase::Collecting { base, actions } => (base, actions),
        };
        for action in actions {
            action(&mut base);
        }
        let frozen = Arc::new(base);
        *phase = SettingsPhase::Frozen(Arc::clone(&frozen));
        frozen
    }

    /// Returns `true` once the settings have been frozen.
    pub fn is_frozen(&self) -> bool {
        let phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        matches!(*phase, SettingsPhase::Frozen(_))
    }

    /// Returns the tracked source roots (freezes the settings).
    pub fn source_roots(&self) -> Vec<PathBuf> {
        self.settings().source_roots.clone()
    }
}

impl fmt::Debug for TrackedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedModule")
            .field("project_dir", &self.project_dir)
            .field("name", &self.name.get())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

impl fmt::Display for TrackedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module[{}]", self.project_dir.display())
    }
}
