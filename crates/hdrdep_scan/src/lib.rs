//! Directive scanning for C, C++ and Objective-C sources.
//!
//! This crate turns raw file text into the inputs of the include graph:
//!
//! - **Extractor** ([`extract`]): a permissive line scanner that finds every
//!   `#include`, `#import` and `#define`, ignoring conditional compilation.
//! - **Classifier** ([`directive`]): maps a raw include argument to an
//!   [`IncludeDirective`] of kind system, quoted or macro.
//! - **Macros** ([`macros`]): the per-translation-unit [`MacroTable`] and the
//!   resolver that reduces macro includes to literal header names.

#![warn(missing_docs)]

pub mod directive;
pub mod error;
pub mod extract;
pub mod macros;

pub use directive::{classify, IncludeDirective, IncludeKind};
pub use error::ScanError;
pub use extract::{extract, DefineEntry, FileDirectives, IncludeEntry};
pub use macros::{resolve_macro, MacroDefinition, MacroResolution, MacroTable};
