//! Compiled-engine cache.
//!
//! An [`EngineCache`] turns a [`ConfigurationDescriptor`] into a shared
//! [`CompiledEngine`], building each descriptor at most once until it is
//! invalidated. Builds go through the [`BuildEngine`] seam; the production
//! [`EngineBuilder`] resolves the document, anchors relative suppression
//! paths against the [`BuildContext`], and configures a rule engine on a
//! dedicated worker thread.
//!
//! [`ConfigurationDescriptor`]: kestrel_config::ConfigurationDescriptor

#![warn(missing_docs)]

pub mod builder;
pub mod cache;
pub mod compiled;
pub mod context;
pub mod error;
pub mod suppression_path;

pub use builder::{build_engine, BuildEngine, EngineBuilder};
pub use cache::EngineCache;
pub use compiled::CompiledEngine;
pub use context::{BuildContext, ModuleContext};
pub use error::CacheError;
pub use suppression_path::{anchor_suppression_paths, resolve_suppression_path};
