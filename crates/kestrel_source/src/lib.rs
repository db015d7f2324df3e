//! Host source buffers and their identities.
//!
//! The host keeps source text in memory with `\n` as its only line marker.
//! This crate provides [`SourceRef`] (the identity diagnostics are keyed by),
//! [`SourceBuffer`] (text plus a line index), the [`SourceDb`] buffer store,
//! and [`LineSeparator`] for the on-disk form handed to the engine.

#![warn(missing_docs)]

pub mod line_separator;
pub mod source_buffer;
pub mod source_db;
pub mod source_ref;

pub use line_separator::{LineSeparator, ParseLineSeparatorError};
pub use source_buffer::SourceBuffer;
pub use source_db::SourceDb;
pub use source_ref::SourceRef;
