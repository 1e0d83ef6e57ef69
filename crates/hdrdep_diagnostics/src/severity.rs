//! Severity levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much a diagnostic matters to the build, least severe first.
///
/// Only [`Severity::Error`] blocks the snapshot commit. Unresolved and
/// ambiguous includes are warnings because the engine already compensates by
/// rebuilding conservatively.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, e.g. an include cycle.
    Note,
    /// Dependency information is incomplete.
    Warning,
    /// The build cannot be trusted.
    Error,
}

impl Severity {
    /// Every severity, in ascending order.
    pub const ALL: [Severity; 3] = [Severity::Note, Severity::Warning, Severity::Error];

    /// `true` for [`Severity::Error`].
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// Lowercase name as printed in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
