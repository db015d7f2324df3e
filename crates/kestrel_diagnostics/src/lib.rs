//! Findings reported by the analysis engine, and how they are rendered.
//!
//! A [`Diagnostic`] is an immutable value tied to the [`SourceRef`] of the
//! buffer it was found in. The thread-safe [`DiagnosticSink`] accumulates
//! diagnostics across files, and [`DiagnosticRenderer`] implementations format
//! them for the terminal.
//!
//! [`SourceRef`]: kestrel_source::SourceRef

#![warn(missing_docs)]

pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::{ParseSeverityError, Severity};
pub use sink::DiagnosticSink;
