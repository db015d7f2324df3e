//! `kestrel check`: scan files with the configured rules.
//!
//! 1. Read stored settings, if any
//! 2. Pick the configuration and staging line separator
//! 3. Load the files, skipping test sources unless settings allow them
//! 4. Build (or reuse) the engine and run one background scan
//! 5. Render diagnostics and failures

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use kestrel_cache::{EngineBuilder, EngineCache};
use kestrel_config::{DefaultResolver, ScanSettings};
use kestrel_diagnostics::{DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer};
use kestrel_engine::CheckRegistry;
use kestrel_scan::{ProgressObserver, ScanOptions, ScanReport, ScanSession, TaskState};
use kestrel_source::{SourceDb, SourceRef};
use serde_json::json;

use crate::setup::{self, LoadedSettings, DEFAULT_SETTINGS_FILE};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// Logs per-file progress at debug level.
struct LogProgress;

impl ProgressObserver for LogProgress {
    fn file_processed(&self, source: &SourceRef, done: usize, total: usize) {
        tracing::debug!(file = %source, done, total, "file checked");
    }

    fn scan_finished(&self, state: TaskState) {
        tracing::debug!(%state, "scan finished");
    }
}

/// A file that could not be read from disk.
#[derive(Debug)]
struct Unread {
    path: String,
    error: String,
}

/// Runs the `kestrel check` command.
///
/// Returns exit code 1 if any error-severity diagnostic was reported, any file
/// could not be checked, or the scan did not complete.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let loaded = open_settings(args, global)?;
    let settings = loaded.as_ref().map(|l| &l.settings);

    let descriptor = setup::resolve_descriptor(args, settings);
    let line_separator = setup::line_separator(args, settings)?;
    let scan_tests = settings.map_or(true, ScanSettings::scan_test_sources);

    let mut db = SourceDb::new();
    let mut unread = Vec::new();
    for path in &args.files {
        if !scan_tests && setup::is_test_source(path) {
            tracing::debug!(file = %path.display(), "skipping test source");
            continue;
        }
        if let Err(e) = db.load_file(path) {
            unread.push(Unread {
                path: path.display().to_string(),
                error: e.to_string(),
            });
        }
    }

    if db.is_empty() && unread.is_empty() {
        if !global.quiet {
            eprintln!("warning: no files to check");
        }
        return Ok(0);
    }

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!("   Checking {} file(s) with {descriptor}", db.len());
    }
    if global.verbose {
        eprintln!("   Configuration: {}", descriptor.to_descriptor_string());
        eprintln!("   Line separator: {}", line_separator.name());
    }

    let mut resolver = DefaultResolver::new();
    if let Some(dir) = &args.project_dir {
        resolver = resolver.with_project_dir(dir.clone());
    }
    let builder = EngineBuilder::new(
        Arc::new(resolver),
        Arc::new(CheckRegistry::with_builtin_checks()),
    );
    let session = ScanSession::new(EngineCache::new(builder)).with_options(ScanOptions {
        line_separator,
        ..ScanOptions::default()
    });

    let report = session.scan_and_wait(
        &descriptor,
        &setup::build_context(args),
        None,
        db.buffers().to_vec(),
        Arc::new(LogProgress),
    );
    session.shutdown();
    let report = report?;

    let sink = DiagnosticSink::new();
    sink.emit_all(report.diagnostics().cloned());

    match args.format {
        ReportFormat::Text => render_text(&report, &sink, &unread, &db, global),
        ReportFormat::Json => {
            let json = json_report(&report, &sink, &unread);
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(exit_code(&report, &sink, &unread))
}

/// Opens `--settings`, or the default settings file when it exists.
fn open_settings(
    args: &CheckArgs,
    global: &GlobalArgs,
) -> Result<Option<LoadedSettings>, Box<dyn Error>> {
    let path = match &global.settings {
        Some(path) => path.clone(),
        None if Path::new(DEFAULT_SETTINGS_FILE).is_file() => DEFAULT_SETTINGS_FILE.into(),
        None => return Ok(None),
    };
    Ok(Some(LoadedSettings::open(&path, args.project_dir.clone())?))
}

fn render_text(
    report: &ScanReport,
    sink: &DiagnosticSink,
    unread: &[Unread],
    db: &SourceDb,
    global: &GlobalArgs,
) {
    let renderer = TerminalRenderer::new(global.color);
    for diag in &sink.diagnostics() {
        eprintln!("{}", renderer.render(diag, db));
    }
    for file in report.failed_files() {
        if let Some(err) = &file.error {
            eprintln!("error: could not check {}: {err}", file.source);
        }
    }
    for file in unread {
        eprintln!("error: could not read {}: {}", file.path, file.error);
    }
    if report.state != TaskState::Completed {
        eprintln!("warning: scan {}", report.state);
    }

    if !global.quiet {
        eprintln!(
            "   Result: {} error(s), {} warning(s)",
            sink.error_count(),
            sink.count(Severity::Warning)
        );
    }
}

fn json_report(
    report: &ScanReport,
    sink: &DiagnosticSink,
    unread: &[Unread],
) -> serde_json::Value {
    let diagnostics = sink.diagnostics();
    let failures: Vec<_> = report
        .failed_files()
        .filter_map(|f| {
            f.error
                .as_ref()
                .map(|e| json!({ "file": f.source.to_string(), "error": e.to_string() }))
        })
        .chain(
            unread
                .iter()
                .map(|u| json!({ "file": u.path, "error": u.error })),
        )
        .collect();
    json!({
        "state": report.state.to_string(),
        "diagnostics": diagnostics,
        "failures": failures,
    })
}

fn exit_code(report: &ScanReport, sink: &DiagnosticSink, unread: &[Unread]) -> i32 {
    let failed = report.state != TaskState::Completed
        || !unread.is_empty()
        || report.failed_files().next().is_some()
        || sink.has_errors();
    i32::from(failed)
}
