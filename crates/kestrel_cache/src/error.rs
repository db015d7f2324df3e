//! Error types for engine builds and cache lookups.

use std::sync::Arc;

use kestrel_config::{ConfigError, ResolutionError};

/// Errors returned by [`EngineCache`](crate::EngineCache) and engine builders.
///
/// The error is cloneable so every caller waiting on the same build receives
/// the same failure. Underlying errors are shared through `Arc`.
#[derive(Clone, Debug, thiserror::Error)]
pub enum CacheError {
    /// The configuration document could not be fetched.
    #[error("could not fetch configuration: {0}")]
    Resolution(#[source] Arc<ResolutionError>),

    /// The configuration document was fetched but is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(#[source] Arc<ConfigError>),

    /// A compiled configuration was requested before any successful build.
    #[error("no engine has been built for {0}")]
    NotBuilt(String),

    /// The build panicked.
    #[error("engine build panicked: {0}")]
    BuildPanicked(String),

    /// The build worker thread could not be started.
    #[error("could not start engine build worker: {0}")]
    Spawn(String),
}

impl From<ResolutionError> for CacheError {
    fn from(err: ResolutionError) -> Self {
        CacheError::Resolution(Arc::new(err))
    }
}

impl From<ConfigError> for CacheError {
    fn from(err: ConfigError) -> Self {
        CacheError::Configuration(Arc::new(err))
    }
}
