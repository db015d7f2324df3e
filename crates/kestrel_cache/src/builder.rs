//! Engine builds: document to configured engine.

use std::path::Path;
use std::sync::Arc;

use kestrel_common::{panic_message, ContentHash};
use kestrel_config::{load_document, ConfigurationDescriptor, ConfigurationResolver};
use kestrel_engine::{CheckRegistry, RuleEngine};

use crate::compiled::CompiledEngine;
use crate::context::BuildContext;
use crate::error::CacheError;
use crate::suppression_path::anchor_suppression_paths;

/// Builds a [`CompiledEngine`] for a descriptor.
///
/// The seam between [`EngineCache`](crate::EngineCache) and the work of
/// building, so the cache can be exercised with substitute builders.
pub trait BuildEngine: Send + Sync {
    /// Builds an engine. `registry` overrides the builder's default checks.
    fn build(
        &self,
        descriptor: &ConfigurationDescriptor,
        context: &BuildContext,
        registry: Option<Arc<CheckRegistry>>,
    ) -> Result<CompiledEngine, CacheError>;
}

/// The production builder.
///
/// Each build runs on its own named worker thread and the caller blocks on
/// the join. Only the registry handed to the build is visible to it.
pub struct EngineBuilder {
    resolver: Arc<dyn ConfigurationResolver>,
    registry: Arc<CheckRegistry>,
}

impl EngineBuilder {
    /// Creates a builder fetching documents through `resolver` and using
    /// `registry` when a build is not given one.
    pub fn new(resolver: Arc<dyn ConfigurationResolver>, registry: Arc<CheckRegistry>) -> Self {
        Self { resolver, registry }
    }

    /// Returns the default registry.
    pub fn registry(&self) -> &Arc<CheckRegistry> {
        &self.registry
    }
}

impl BuildEngine for EngineBuilder {
    fn build(
        &self,
        descriptor: &ConfigurationDescriptor,
        context: &BuildContext,
        registry: Option<Arc<CheckRegistry>>,
    ) -> Result<CompiledEngine, CacheError> {
        let registry = registry.unwrap_or_else(|| Arc::clone(&self.registry));
        let resolver = Arc::clone(&self.resolver);
        let descriptor = descriptor.clone();
        let context = context.clone();

        let worker = std::thread::Builder::new()
            .name("kestrel-engine-build".to_string())
            .spawn(move || build_engine(resolver.as_ref(), &descriptor, &context, &registry))
            .map_err(|e| CacheError::Spawn(e.to_string()))?;
        worker
            .join()
            .unwrap_or_else(|payload| Err(CacheError::BuildPanicked(panic_message(payload.as_ref()))))
    }
}

/// Resolves, parses, anchors, and configures, on the current thread.
pub fn build_engine(
    resolver: &dyn ConfigurationResolver,
    descriptor: &ConfigurationDescriptor,
    context: &BuildContext,
    registry: &CheckRegistry,
) -> Result<CompiledEngine, CacheError> {
    tracing::debug!(configuration = %descriptor, "building engine");
    for (name, value) in descriptor.properties() {
        tracing::debug!("- property: {name}={value}");
    }
    tracing::debug!(checks = ?registry.names(), "available checks");

    let document = resolver.resolve(descriptor)?;
    let mut root = load_document(&document.bytes, &document.property_resolver(descriptor))?;

    let search_dirs = context.search_dirs(document.base_dir.as_deref());
    anchor_suppression_paths(&mut root, &search_dirs, Path::exists);

    let engine = RuleEngine::configure(&root, registry)?;
    tracing::info!(
        configuration = %descriptor,
        checks = engine.check_names().len(),
        "engine built"
    );
    Ok(
        CompiledEngine::new(Box::new(engine), root, descriptor.clone())
            .with_document(ContentHash::from_bytes(&document.bytes), document.source_path),
    )
}
