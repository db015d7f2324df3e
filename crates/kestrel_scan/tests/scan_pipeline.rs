//! End-to-end tests: configuration on disk, cached engine, background scans.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Barrier, Mutex};

use kestrel_cache::{BuildContext, EngineBuilder, EngineCache, ModuleContext};
use kestrel_config::{ConfigurationDescriptor, DefaultResolver};
use kestrel_engine::CheckRegistry;
use kestrel_scan::{
    FileError, FileStager, NoProgress, ProgressObserver, ScanOptions, ScanSession, TaskState,
};
use kestrel_source::{LineSeparator, SourceDb, SourceRef};
use tempfile::TempDir;

const CHECKS: &str = r#"<?xml version="1.0"?>
<!DOCTYPE module PUBLIC "-//Kestrel//DTD Configuration 1.0//EN" "configuration_1_0.dtd">
<module name="Checker">
  <property name="severity" value="warning"/>
  <module name="SuppressionFilter">
    <property name="file" value="suppressions.xml"/>
  </module>
  <module name="LineLength">
    <property name="max" value="${line.max}" default="20"/>
  </module>
  <module name="TreeWalker">
    <module name="RegexpSingleline">
      <property name="severity" value="error"/>
      <property name="format" value="System\.out"/>
      <property name="message" value="Use a logger."/>
    </module>
  </module>
</module>
"#;

const SUPPRESSIONS: &str = r#"<?xml version="1.0"?>
<suppressions>
  <suppress checks="LineLength" files="Generated\.java$"/>
</suppressions>
"#;

struct Project {
    rules: TempDir,
    module: TempDir,
    staging: TempDir,
}

impl Project {
    fn new() -> Self {
        let rules = tempfile::tempdir().unwrap();
        let module = tempfile::tempdir().unwrap();
        fs::write(rules.path().join("checks.xml"), CHECKS).unwrap();
        fs::create_dir_all(module.path().join("src")).unwrap();
        fs::create_dir_all(module.path().join("config")).unwrap();
        fs::write(module.path().join("config/suppressions.xml"), SUPPRESSIONS).unwrap();
        Self {
            rules,
            module,
            staging: tempfile::tempdir().unwrap(),
        }
    }

    fn config_path(&self) -> std::path::PathBuf {
        self.rules.path().join("checks.xml")
    }

    fn descriptor(&self) -> ConfigurationDescriptor {
        ConfigurationDescriptor::local_file(self.config_path().to_str().unwrap(), "Project checks")
    }

    fn context(&self) -> BuildContext {
        BuildContext::new(Some(self.module.path().to_path_buf())).with_module(
            ModuleContext::new("app")
                .with_content_root(self.module.path().join("src"))
                .with_content_root(self.module.path().join("config")),
        )
    }

    fn session(&self, separator: LineSeparator) -> ScanSession {
        let builder = EngineBuilder::new(
            Arc::new(DefaultResolver::new()),
            Arc::new(CheckRegistry::with_builtin_checks()),
        );
        ScanSession::new(EngineCache::new(builder)).with_options(ScanOptions {
            stager: FileStager::new().in_dir(self.staging.path()),
            line_separator: separator,
        })
    }
}

fn sources() -> SourceDb {
    let mut db = SourceDb::new();
    db.add_source(
        "src/Main.java",
        "class Main {\n    void run() { System.out.println(1); }\n}\n".to_string(),
    );
    db.add_source(
        "src/Generated.java",
        "class Generated { int aVeryLongFieldName; }\n".to_string(),
    );
    db.add_source("src/Ok.java", "class Ok {}\n".to_string());
    db
}

#[test]
fn full_pipeline_with_suppressions() {
    let project = Project::new();
    let session = project.session(LineSeparator::CrLf);
    let db = sources();

    let report = session
        .scan_and_wait(
            &project.descriptor(),
            &project.context(),
            None,
            db.buffers().to_vec(),
            Arc::new(NoProgress),
        )
        .unwrap();

    assert_eq!(report.state, TaskState::Completed);
    assert!(report.failed_files().next().is_none());

    let main = report.diagnostics_for(&SourceRef::new(0, "src/Main.java")).unwrap();
    let checks: Vec<_> = main.iter().map(|d| (d.line, d.check.as_str())).collect();
    assert_eq!(checks, vec![(2, "LineLength"), (2, "RegexpSingleline")]);
    assert_eq!(main[1].message, "Use a logger.");
    assert!(main[1].severity.is_error());
    assert!(!main[0].severity.is_error());

    let generated = report.diagnostics_for(&SourceRef::new(1, "src/Generated.java")).unwrap();
    assert!(generated.is_empty());
    assert!(report.diagnostics_for(&SourceRef::new(2, "src/Ok.java")).unwrap().is_empty());

    let config = session.cache().get_compiled_config(&project.descriptor()).unwrap();
    let anchored = config.find("SuppressionFilter").unwrap().property("file").unwrap();
    assert_eq!(
        Path::new(anchored),
        project.module.path().join("config/suppressions.xml")
    );
    assert_eq!(fs::read_dir(project.staging.path()).unwrap().count(), 0);
}

#[test]
fn override_property_changes_cache_key() {
    let project = Project::new();
    let session = project.session(LineSeparator::Lf);
    let db = sources();
    let relaxed = project.descriptor().with_property("line.max", "200");

    let report = session
        .scan_and_wait(&relaxed, &project.context(), None, db.buffers().to_vec(), Arc::new(NoProgress))
        .unwrap();
    let main = report.diagnostics_for(&SourceRef::new(0, "src/Main.java")).unwrap();
    assert_eq!(main.len(), 1);
    assert_eq!(main[0].check, "RegexpSingleline");
    assert!(session.cache().is_ready(&relaxed));
    assert!(!session.cache().is_ready(&project.descriptor()));
}

#[test]
fn concurrent_scans_share_one_engine() {
    let project = Project::new();
    let session = Arc::new(project.session(LineSeparator::Lf));
    let db = Arc::new(sources());
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let session = Arc::clone(&session);
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            let descriptor = project.descriptor();
            let context = project.context();
            std::thread::spawn(move || {
                barrier.wait();
                session
                    .scan_and_wait(&descriptor, &context, None, db.buffers().to_vec(), Arc::new(NoProgress))
                    .unwrap()
            })
        })
        .collect();
    let counts: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().diagnostic_count())
        .collect();

    assert!(counts.iter().all(|&c| c == 2));
    assert_eq!(session.cache().len(), 1);
    assert!(!session.coordinator().is_any_running());
}

#[test]
fn edited_configuration_is_rebuilt() {
    let project = Project::new();
    let session = project.session(LineSeparator::Lf);
    let descriptor = project.descriptor();
    let before = session.cache().get_engine(&descriptor, &project.context(), None).unwrap();

    fs::write(project.config_path(), r#"<module name="Checker"/>"#).unwrap();
    assert_eq!(session.cache().invalidate_stale(), 1);

    let after = session.cache().get_engine(&descriptor, &project.context(), None).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert!(after.config().children().is_empty());
}

#[test]
fn missing_suppression_file_fails_each_file() {
    let project = Project::new();
    fs::remove_file(project.module.path().join("config/suppressions.xml")).unwrap();
    let session = project.session(LineSeparator::Lf);
    let db = sources();

    let report = session
        .scan_and_wait(
            &project.descriptor(),
            &project.context(),
            None,
            db.buffers().to_vec(),
            Arc::new(NoProgress),
        )
        .unwrap();
    assert_eq!(report.state, TaskState::Completed);
    let failed: Vec<_> = report.failed_files().collect();
    assert_eq!(failed.len(), 2);
    assert!(failed
        .iter()
        .all(|f| matches!(f.error.as_deref(), Some(FileError::Engine(_)))));
}

#[derive(Default)]
struct Counter {
    seen: Mutex<Vec<(usize, usize)>>,
}

impl ProgressObserver for Counter {
    fn file_processed(&self, _source: &SourceRef, done: usize, total: usize) {
        self.seen.lock().unwrap().push((done, total));
    }
}

#[test]
fn progress_reaches_observer() {
    let project = Project::new();
    let session = project.session(LineSeparator::Lf);
    let db = sources();
    let counter = Arc::new(Counter::default());

    let task = session
        .scan(
            &project.descriptor(),
            &project.context(),
            None,
            db.buffers().to_vec(),
            counter.clone(),
        )
        .unwrap();
    task.join().unwrap();
    assert_eq!(*counter.seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
}
