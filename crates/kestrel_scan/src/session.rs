//! A host session: one engine cache, one coordinator, one staging setup.

use std::sync::Arc;

use kestrel_cache::{BuildContext, BuildEngine, EngineBuilder, EngineCache};
use kestrel_config::ConfigurationDescriptor;
use kestrel_engine::CheckRegistry;
use kestrel_source::SourceBuffer;

use crate::coordinator::ScanCoordinator;
use crate::error::SessionError;
use crate::progress::ProgressObserver;
use crate::report::ScanReport;
use crate::task::{ScanOptions, ScanTask};

/// Owns the scan lifecycle for one host session.
///
/// The cache is created with the session and torn down by [`shutdown`],
/// which also stops every running scan.
///
/// [`shutdown`]: ScanSession::shutdown
pub struct ScanSession<B: BuildEngine = EngineBuilder> {
    cache: Arc<EngineCache<B>>,
    coordinator: ScanCoordinator,
    options: ScanOptions,
}

impl<B: BuildEngine> ScanSession<B> {
    /// Creates a session over `cache` with default staging.
    pub fn new(cache: EngineCache<B>) -> Self {
        Self {
            cache: Arc::new(cache),
            coordinator: ScanCoordinator::new(),
            options: ScanOptions::default(),
        }
    }

    /// Sets how files are staged.
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the engine cache.
    pub fn cache(&self) -> &Arc<EngineCache<B>> {
        &self.cache
    }

    /// Returns the coordinator.
    pub fn coordinator(&self) -> &ScanCoordinator {
        &self.coordinator
    }

    /// Returns the staging options.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Starts a background scan of `files` with the engine for `descriptor`.
    ///
    /// Blocks only while the engine is being built.
    pub fn scan(
        &self,
        descriptor: &ConfigurationDescriptor,
        context: &BuildContext,
        registry: Option<Arc<CheckRegistry>>,
        files: Vec<Arc<SourceBuffer>>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<ScanTask, SessionError> {
        let engine = self.cache.get_engine(descriptor, context, registry)?;
        let task = ScanTask::new(engine, files, self.options.clone());
        self.coordinator.launch(&task, observer)?;
        Ok(task)
    }

    /// Scans `files` and waits for the report.
    pub fn scan_and_wait(
        &self,
        descriptor: &ConfigurationDescriptor,
        context: &BuildContext,
        registry: Option<Arc<CheckRegistry>>,
        files: Vec<Arc<SourceBuffer>>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<ScanReport, SessionError> {
        let task = self.scan(descriptor, context, registry, files, observer)?;
        Ok(task.join()?)
    }

    /// Stops every scan and drops every cached engine.
    pub fn shutdown(&self) {
        self.coordinator.stop_all();
        self.cache.clear();
        tracing::debug!("scan session shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::staging::FileStager;
    use crate::task::TaskState;
    use kestrel_config::DefaultResolver;
    use kestrel_source::{LineSeparator, SourceRef};

    fn session(dir: &std::path::Path) -> ScanSession {
        let resolver = DefaultResolver::new().with_embedded(
            "/short.xml",
            r#"<module name="Checker">
                 <module name="LineLength"><property name="max" value="5"/></module>
               </module>"#,
        );
        let builder = EngineBuilder::new(
            Arc::new(resolver),
            Arc::new(CheckRegistry::with_builtin_checks()),
        );
        ScanSession::new(EngineCache::new(builder)).with_options(ScanOptions {
            stager: FileStager::new().in_dir(dir),
            line_separator: LineSeparator::CrLf,
        })
    }

    fn short() -> ConfigurationDescriptor {
        ConfigurationDescriptor::classpath("/short.xml", "Short lines")
    }

    #[test]
    fn scan_reports_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let files = vec![
            Arc::new(SourceBuffer::new(SourceRef::new(0, "A.java"), "ok\ntoo long line\n".to_string())),
            Arc::new(SourceBuffer::new(SourceRef::new(1, "B.java"), "fine\n".to_string())),
        ];
        let report = session
            .scan_and_wait(&short(), &BuildContext::default(), None, files, Arc::new(NoProgress))
            .unwrap();
        assert_eq!(report.state, TaskState::Completed);
        let a = report.diagnostics_for(&SourceRef::new(0, "A.java")).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].line, 2);
        assert!(report.diagnostics_for(&SourceRef::new(1, "B.java")).unwrap().is_empty());
        assert!(!session.coordinator().is_any_running());
        assert!(session.cache().is_ready(&short()));
    }

    #[test]
    fn unknown_configuration_fails_before_scanning() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let missing = ConfigurationDescriptor::classpath("/missing.xml", "");
        let err = session
            .scan(&missing, &BuildContext::default(), None, Vec::new(), Arc::new(NoProgress))
            .unwrap_err();
        assert!(matches!(err, SessionError::Cache(_)));
        assert!(!session.coordinator().is_any_running());
    }

    #[test]
    fn shutdown_clears_cache() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        session
            .scan_and_wait(&short(), &BuildContext::default(), None, Vec::new(), Arc::new(NoProgress))
            .unwrap();
        assert_eq!(session.cache().len(), 1);
        session.shutdown();
        assert!(session.cache().is_empty());
    }
}
