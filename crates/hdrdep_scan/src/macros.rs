//! Macro definitions, the per-unit macro table and the macro include resolver.
//!
//! The resolver does not run a preprocessor. It substitutes textually, one
//! candidate definition at a time, until the text classifies as a quoted or
//! system include. Anything it cannot reduce is reported rather than guessed.

use crate::directive::{classify, IncludeDirective, IncludeKind};
use hdrdep_common::{ContentHash, ContentHasher};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Maximum nesting of macro-to-macro substitutions.
pub const MAX_EXPANSION_DEPTH: usize = 16;

/// A `#define`, object-like or function-like.
///
/// Equality is structural. The owning file is not part of the definition; the
/// [`MacroTable`] keeps it alongside.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct MacroDefinition {
    name: String,
    parameters: Option<Vec<String>>,
    replacement: String,
}

impl MacroDefinition {
    /// An object-like macro: `#define NAME replacement`.
    pub fn object(name: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: None,
            replacement: replacement.into(),
        }
    }

    /// A function-like macro: `#define NAME(params) replacement`.
    pub fn function(
        name: impl Into<String>,
        parameters: Vec<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parameters: Some(parameters),
            replacement: replacement.into(),
        }
    }

    /// The macro name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter names, or `None` for an object-like macro.
    pub fn parameters(&self) -> Option<&[String]> {
        self.parameters.as_deref()
    }

    /// The replacement text, trimmed.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// `true` if the macro takes a parameter list.
    pub fn is_function_like(&self) -> bool {
        self.parameters.is_some()
    }
}

#[derive(Clone, Debug)]
struct MacroEntry {
    owner: Option<PathBuf>,
    definition: MacroDefinition,
}

/// The macros visible to one translation unit, in definition order.
///
/// Each file contributes its own definitions; within one file a later
/// definition of a name replaces the earlier one. Definitions from different
/// files are all kept so that the resolver can see every candidate.
/// Predefined macros have no owner file.
#[derive(Clone, Debug, Default)]
pub struct MacroTable {
    by_name: HashMap<String, Vec<MacroEntry>>,
}

impl MacroTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the given predefined object-like macros.
    pub fn with_predefined<'a>(defines: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut table = Self::new();
        for (name, value) in defines {
            table.define(None, MacroDefinition::object(name, value));
        }
        table
    }

    /// Records `definition` as written by `owner` (`None` for predefined).
    pub fn define(&mut self, owner: Option<&Path>, definition: MacroDefinition) {
        let entries = self.by_name.entry(definition.name.clone()).or_default();
        entries.retain(|e| e.owner.as_deref() != owner);
        entries.push(MacroEntry {
            owner: owner.map(Path::to_path_buf),
            definition,
        });
    }

    /// The most recently written definition of `name`.
    pub fn current(&self, name: &str) -> Option<&MacroDefinition> {
        self.by_name
            .get(name)
            .and_then(|entries| entries.last())
            .map(|e| &e.definition)
    }

    /// Every distinct visible definition of `name`, most recent first.
    pub fn candidates(&self, name: &str) -> Vec<&MacroDefinition> {
        let mut out: Vec<&MacroDefinition> = Vec::new();
        if let Some(entries) = self.by_name.get(name) {
            for entry in entries.iter().rev() {
                if !out.contains(&&entry.definition) {
                    out.push(&entry.definition);
                }
            }
        }
        out
    }

    /// Files that contributed at least one definition.
    pub fn defining_files(&self) -> BTreeSet<PathBuf> {
        self.by_name
            .values()
            .flatten()
            .filter_map(|e| e.owner.clone())
            .collect()
    }

    /// A digest of every visible definition, independent of definition order
    /// and of which file wrote it.
    pub fn environment_hash(&self) -> ContentHash {
        let definitions: BTreeSet<&MacroDefinition> = self
            .by_name
            .values()
            .flatten()
            .map(|e| &e.definition)
            .collect();
        let mut hasher = ContentHasher::new();
        for def in definitions {
            hasher.write_str(&def.name);
            match &def.parameters {
                None => {
                    hasher.write_part(b"");
                }
                Some(params) => {
                    hasher.write_part(b"(");
                    for p in params {
                        hasher.write_str(p);
                    }
                    hasher.write_part(b")");
                }
            }
            hasher.write_str(&def.replacement);
        }
        hasher.finish()
    }

    /// Number of recorded definitions.
    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    /// `true` if no macro is defined.
    pub fn is_empty(&self) -> bool {
        self.by_name.values().all(Vec::is_empty)
    }
}

/// Outcome of reducing a macro include to header names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MacroResolution {
    /// A single literal, reached through every visible definition.
    Exact(IncludeDirective),
    /// Several literals, or literals alongside definitions that could not be
    /// reduced. All literals are dependencies.
    Ambiguous(Vec<IncludeDirective>),
    /// No definition reduced to a literal.
    Unresolved,
}

/// Reduces the macro expression `expr` (`NAME` or `NAME(args...)`) against
/// `table`. The resulting directives carry `is_import`.
pub fn resolve_macro(expr: &str, is_import: bool, table: &MacroTable) -> MacroResolution {
    let mut reducer = Reducer {
        table,
        is_import,
        literals: Vec::new(),
        irreducible: false,
        active: Vec::new(),
    };
    reducer.reduce(expr, 0);

    let Reducer {
        mut literals,
        irreducible,
        ..
    } = reducer;
    if literals.is_empty() {
        MacroResolution::Unresolved
    } else if literals.len() == 1 && !irreducible {
        MacroResolution::Exact(literals.swap_remove(0))
    } else {
        MacroResolution::Ambiguous(literals)
    }
}

struct Reducer<'a> {
    table: &'a MacroTable,
    is_import: bool,
    literals: Vec<IncludeDirective>,
    irreducible: bool,
    active: Vec<String>,
}

impl Reducer<'_> {
    fn reduce(&mut self, text: &str, depth: usize) {
        let text = text.trim();
        if text.is_empty() {
            self.irreducible = true;
            return;
        }
        if let Ok(directive) = classify(text, self.is_import) {
            if directive.kind() != IncludeKind::Macro {
                if !self.literals.contains(&directive) {
                    self.literals.push(directive);
                }
                return;
            }
        }
        if depth >= MAX_EXPANSION_DEPTH {
            self.irreducible = true;
            return;
        }
        let Some((name, args)) = parse_invocation(text) else {
            self.irreducible = true;
            return;
        };
        if self.active.iter().any(|a| a == name) {
            self.irreducible = true;
            return;
        }
        let table = self.table;
        let candidates = table.candidates(name);
        if candidates.is_empty() {
            self.irreducible = true;
            return;
        }
        self.active.push(name.to_string());
        for def in candidates {
            match expand(def, args.as_deref()) {
                Some(expansion) => self.reduce(&expansion, depth + 1),
                None => self.irreducible = true,
            }
        }
        self.active.pop();
    }
}

/// One substitution step, or `None` if the definition cannot be applied.
fn expand(def: &MacroDefinition, args: Option<&[String]>) -> Option<String> {
    if def.replacement.contains('#') {
        return None;
    }
    match (def.parameters(), args) {
        (None, None) => Some(def.replacement.clone()),
        (Some(params), Some(args)) if params.len() == args.len() => {
            Some(substitute(&def.replacement, params, args))
        }
        _ => None,
    }
}

/// Replaces each identifier token equal to a parameter with its argument.
/// String literals are copied unchanged.
fn substitute(replacement: &str, params: &[String], args: &[String]) -> String {
    let bytes = replacement.as_bytes();
    let mut out = String::with_capacity(replacement.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' || b == b'\'' {
            let start = i;
            i += 1;
            while i < bytes.len() && bytes[i] != b {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(bytes.len());
            out.push_str(&replacement[start..i]);
        } else if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let ident = &replacement[start..i];
            match params.iter().position(|p| p == ident) {
                Some(idx) => out.push_str(&args[idx]),
                None => out.push_str(ident),
            }
        } else {
            let start = i;
            i += 1;
            while i < bytes.len() && !replacement.is_char_boundary(i) {
                i += 1;
            }
            out.push_str(&replacement[start..i]);
        }
    }
    out
}

/// Parses `NAME` or `NAME(args...)`. `NAME()` has zero arguments.
fn parse_invocation(text: &str) -> Option<(&str, Option<Vec<String>>)> {
    let bytes = text.as_bytes();
    if !bytes
        .first()
        .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_')
    {
        return None;
    }
    let len = bytes
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
        .unwrap_or(bytes.len());
    let name = &text[..len];
    let rest = text[len..].trim_start();
    if rest.is_empty() {
        return Some((name, None));
    }
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some((name, Some(split_arguments(inner)?)))
}

/// Splits on commas outside nested parentheses and string literals.
fn split_arguments(inner: &str) -> Option<Vec<String>> {
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut current = String::new();
    for c in inner.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.checked_sub(1)?;
                current.push(c);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    args.push(current.trim().to_string());
    Some(args)
}
