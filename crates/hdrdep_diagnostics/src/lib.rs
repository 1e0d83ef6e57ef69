//! Diagnostic creation, severity management, and rendering.
//!
//! Unresolved and ambiguous includes, include cycles and strict-mode failures
//! are reported as structured [`Diagnostic`] values. The thread-safe
//! [`DiagnosticSink`] accumulates them while translation units are analyzed in
//! parallel, and [`DiagnosticRenderer`] implementations format them for the
//! terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
