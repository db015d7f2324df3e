//! A built engine together with the configuration it was built from.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use kestrel_common::ContentHash;
use kestrel_config::{ConfigNode, ConfigurationDescriptor};
use kestrel_diagnostics::Diagnostic;
use kestrel_engine::{AnalysisEngine, EngineError};
use kestrel_source::SourceRef;

/// An engine ready to process files, owned by the cache entry that built it.
///
/// Dropping the last reference destroys the engine, so an evicted engine is
/// released as soon as no scan is still using it.
pub struct CompiledEngine {
    engine: Box<dyn AnalysisEngine>,
    config: Arc<ConfigNode>,
    descriptor: ConfigurationDescriptor,
    built_at: SystemTime,
    document_hash: Option<ContentHash>,
    source_path: Option<PathBuf>,
}

impl CompiledEngine {
    /// Wraps a configured engine.
    pub fn new(
        engine: Box<dyn AnalysisEngine>,
        config: ConfigNode,
        descriptor: ConfigurationDescriptor,
    ) -> Self {
        Self {
            engine,
            config: Arc::new(config),
            descriptor,
            built_at: SystemTime::now(),
            document_hash: None,
            source_path: None,
        }
    }

    /// Records the document the engine was built from, for staleness checks.
    pub fn with_document(mut self, hash: ContentHash, source_path: Option<PathBuf>) -> Self {
        self.document_hash = Some(hash);
        self.source_path = source_path;
        self
    }

    /// Analyses one staged file.
    pub fn process(
        &self,
        staged: &Path,
        source: &SourceRef,
    ) -> Result<Vec<Diagnostic>, EngineError> {
        self.engine.process(staged, source)
    }

    /// Returns the engine.
    pub fn engine(&self) -> &dyn AnalysisEngine {
        self.engine.as_ref()
    }

    /// Returns the parsed configuration tree.
    pub fn config(&self) -> &Arc<ConfigNode> {
        &self.config
    }

    /// Returns the descriptor the engine was built for.
    pub fn descriptor(&self) -> &ConfigurationDescriptor {
        &self.descriptor
    }

    /// Returns when the build finished.
    pub fn built_at(&self) -> SystemTime {
        self.built_at
    }

    /// Returns the hash of the document bytes the engine was built from.
    pub fn document_hash(&self) -> Option<ContentHash> {
        self.document_hash
    }

    /// Returns the file backing the document, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Returns `true` if the backing document changed or vanished since the build.
    ///
    /// Engines built from embedded documents are never stale.
    pub fn is_stale(&self) -> bool {
        let (Some(path), Some(hash)) = (&self.source_path, self.document_hash) else {
            return false;
        };
        match ContentHash::of_file(path) {
            Ok(current) => current != hash,
            Err(_) => true,
        }
    }
}

impl Drop for CompiledEngine {
    fn drop(&mut self) {
        tracing::debug!(configuration = %self.descriptor, "releasing compiled engine");
        self.engine.destroy();
    }
}

impl fmt::Debug for CompiledEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledEngine")
            .field("descriptor", &self.descriptor)
            .field("built_at", &self.built_at)
            .field("document_hash", &self.document_hash)
            .field("source_path", &self.source_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// An engine that reports nothing and records destruction.
    pub(crate) struct FlagEngine(pub Arc<AtomicBool>);

    impl AnalysisEngine for FlagEngine {
        fn process(
            &self,
            _staged: &Path,
            _source: &SourceRef,
        ) -> Result<Vec<Diagnostic>, EngineError> {
            if self.is_destroyed() {
                return Err(EngineError::Destroyed);
            }
            Ok(Vec::new())
        }
        fn destroy(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
        fn is_destroyed(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn compiled(flag: Arc<AtomicBool>) -> CompiledEngine {
        CompiledEngine::new(
            Box::new(FlagEngine(flag)),
            ConfigNode::new("Checker"),
            ConfigurationDescriptor::classpath("/default_checks.xml", "Default"),
        )
    }

    #[test]
    fn drop_destroys_engine() {
        let flag = Arc::new(AtomicBool::new(false));
        let engine = Arc::new(compiled(Arc::clone(&flag)));
        let held_by_scan = Arc::clone(&engine);
        drop(engine);
        assert!(!flag.load(Ordering::SeqCst));
        assert!(held_by_scan
            .process(Path::new("x"), &SourceRef::new(0, "A.java"))
            .is_ok());
        drop(held_by_scan);
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn embedded_document_never_stale() {
        let engine = compiled(Arc::new(AtomicBool::new(false)))
            .with_document(ContentHash::from_bytes(b"x"), None);
        assert!(!engine.is_stale());
    }

    #[test]
    fn staleness_follows_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checks.xml");
        std::fs::write(&path, "v1").unwrap();
        let engine = compiled(Arc::new(AtomicBool::new(false)))
            .with_document(ContentHash::from_bytes(b"v1"), Some(path.clone()));
        assert!(!engine.is_stale());

        std::fs::write(&path, "v2").unwrap();
        assert!(engine.is_stale());

        std::fs::remove_file(&path).unwrap();
        assert!(engine.is_stale());
    }
}
