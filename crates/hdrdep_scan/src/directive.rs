//! Include classification: raw directive argument to [`IncludeDirective`].

use crate::error::ScanError;
use serde::Serialize;
use std::fmt;

/// Syntactic form of an include argument.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum IncludeKind {
    /// `<header.h>`: searched on the include directories only.
    System,
    /// `"header.h"`: searched next to the including file first.
    Quoted,
    /// Anything else, typically a macro name or invocation.
    Macro,
}

impl fmt::Display for IncludeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncludeKind::System => write!(f, "SYSTEM"),
            IncludeKind::Quoted => write!(f, "QUOTED"),
            IncludeKind::Macro => write!(f, "MACRO"),
        }
    }
}

/// An immutable, classified include or import directive.
///
/// Equality and hashing are structural over all three fields, so identical
/// directives parsed from different files compare equal and share cache
/// entries. For [`IncludeKind::System`] and [`IncludeKind::Quoted`] the value
/// excludes the delimiters; for [`IncludeKind::Macro`] it is the raw text.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct IncludeDirective {
    value: String,
    is_import: bool,
    kind: IncludeKind,
}

impl IncludeDirective {
    /// Creates a directive from an already-classified value.
    ///
    /// Fails with [`ScanError::InvalidArgument`] if `value` is empty.
    pub fn new(
        value: impl Into<String>,
        is_import: bool,
        kind: IncludeKind,
    ) -> Result<Self, ScanError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ScanError::InvalidArgument(
                "include value cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            value,
            is_import,
            kind,
        })
    }

    /// The header name (without delimiters) or the raw macro expression.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// `true` for `#import`, `false` for `#include`.
    pub fn is_import(&self) -> bool {
        self.is_import
    }

    /// The syntactic kind.
    pub fn kind(&self) -> IncludeKind {
        self.kind
    }

    /// Re-wraps the value in its delimiters, reproducing the raw argument.
    pub fn to_source_text(&self) -> String {
        match self.kind {
            IncludeKind::System => format!("<{}>", self.value),
            IncludeKind::Quoted => format!("\"{}\"", self.value),
            IncludeKind::Macro => self.value.clone(),
        }
    }
}

impl fmt::Display for IncludeDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.value, self.kind, self.is_import)
    }
}

/// Classifies a raw include argument.
///
/// A leading `<` with a trailing `>` is a system include and a leading and
/// trailing `"` is a quoted include; delimiters are stripped in both cases.
/// Everything else, including the empty forms `<>` and `""`, is a macro
/// include and keeps its text verbatim. Whitespace only or empty input is
/// rejected.
pub fn classify(raw: &str, is_import: bool) -> Result<IncludeDirective, ScanError> {
    if raw.trim().is_empty() {
        return Err(ScanError::InvalidArgument(
            "include value cannot be empty".to_string(),
        ));
    }
    if raw.len() > 2 && raw.starts_with('<') && raw.ends_with('>') {
        return Ok(IncludeDirective {
            value: strip(raw).to_string(),
            is_import,
            kind: IncludeKind::System,
        });
    }
    if raw.len() > 2 && raw.starts_with('"') && raw.ends_with('"') {
        return Ok(IncludeDirective {
            value: strip(raw).to_string(),
            is_import,
            kind: IncludeKind::Quoted,
        });
    }
    Ok(IncludeDirective {
        value: raw.to_string(),
        is_import,
        kind: IncludeKind::Macro,
    })
}

fn strip(raw: &str) -> &str {
    &raw[1..raw.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(d: &IncludeDirective) -> u64 {
        let mut h = DefaultHasher::new();
        d.hash(&mut h);
        h.finish()
    }

    #[test]
    fn system_include() {
        let d = classify("<stdio.h>", false).unwrap();
        assert_eq!(d.kind(), IncludeKind::System);
        assert_eq!(d.value(), "stdio.h");
        assert!(!d.is_import());
    }

    #[test]
    fn quoted_include() {
        let d = classify("\"foo.h\"", false).unwrap();
        assert_eq!(d.kind(), IncludeKind::Quoted);
        assert_eq!(d.value(), "foo.h");
    }

    #[test]
    fn macro_include_is_not_stripped() {
        let d = classify("FOO_HEADER", false).unwrap();
        assert_eq!(d.kind(), IncludeKind::Macro);
        assert_eq!(d.value(), "FOO_HEADER");
    }

    #[test]
    fn mismatched_delimiters_are_macro() {
        assert_eq!(classify("<foo.h\"", false).unwrap().kind(), IncludeKind::Macro);
        assert_eq!(classify("\"foo.h>", false).unwrap().kind(), IncludeKind::Macro);
        assert_eq!(classify("<", false).unwrap().kind(), IncludeKind::Macro);
        assert_eq!(classify("\"", false).unwrap().kind(), IncludeKind::Macro);
        assert_eq!(classify("<>", false).unwrap().kind(), IncludeKind::Macro);
        assert_eq!(classify("\"\"", false).unwrap().kind(), IncludeKind::Macro);
    }

    #[test]
    fn import_flag_is_kept() {
        let d = classify("<Foundation/Foundation.h>", true).unwrap();
        assert!(d.is_import());
        assert_eq!(d.value(), "Foundation/Foundation.h");
    }

    #[test]
    fn empty_value_is_invalid_argument() {
        assert!(matches!(
            classify("", false),
            Err(ScanError::InvalidArgument(_))
        ));
        assert!(matches!(
            classify("   ", true),
            Err(ScanError::InvalidArgument(_))
        ));
        assert!(matches!(
            IncludeDirective::new("", false, IncludeKind::Quoted),
            Err(ScanError::InvalidArgument(_))
        ));
    }

    #[test]
    fn structural_equality_and_hash() {
        let a = classify("\"util/str.h\"", false).unwrap();
        let b = classify("\"util/str.h\"", false).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let import = classify("\"util/str.h\"", true).unwrap();
        assert_ne!(a, import);
        let system = classify("<util/str.h>", false).unwrap();
        assert_ne!(a, system);
    }

    #[test]
    fn rewrapping_reproduces_raw_text() {
        for raw in ["<stdio.h>", "\"foo.h\"", "<sys/types.h>", "\"a b.h\""] {
            let d = classify(raw, false).unwrap();
            assert_eq!(d.to_source_text(), raw);
        }
    }

    #[test]
    fn display_format() {
        let d = classify("<stdio.h>", true).unwrap();
        assert_eq!(d.to_string(), "stdio.h:SYSTEM:true");
    }
}
