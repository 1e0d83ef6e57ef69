//! Diagnostic codes with category prefixes for structured identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Build-blocking problems, prefixed with `E`.
    Error,
    /// Dependency information that is incomplete but handled conservatively,
    /// prefixed with `W`.
    Warning,
    /// Informational findings about the include graph, prefixed with `N`.
    Note,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Note => 'N',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g. `E101`, `W102`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Include not found on any search path while strict mode is enabled.
    pub const STRICT_UNRESOLVED_INCLUDE: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
    /// A root source file could not be read.
    pub const UNREADABLE_SOURCE: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);
    /// Include not found on any search path.
    pub const UNRESOLVED_INCLUDE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);
    /// Macro include that reduces to several distinct headers.
    pub const AMBIGUOUS_MACRO_INCLUDE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 102);
    /// Macro include that cannot be reduced to a literal header name.
    pub const UNRESOLVED_MACRO_INCLUDE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 103);
    /// Files that include each other in a cycle.
    pub const INCLUDE_CYCLE: DiagnosticCode = DiagnosticCode::new(Category::Note, 201);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
