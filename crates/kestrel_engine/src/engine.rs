//! The rule engine: a configured set of checks and suppression filters.
//!
//! A `RuleEngine` is built once from a parsed configuration tree and is then
//! shared read-only by every scan that uses it. `TreeWalker` modules are
//! containers: their children are configured as if they were direct
//! children of the enclosing module.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use kestrel_config::{ConfigError, ConfigNode};
use kestrel_diagnostics::{Diagnostic, Severity};
use kestrel_source::SourceRef;

use crate::check::{Check, CheckRegistry, Finding};
use crate::error::EngineError;
use crate::suppression::SuppressionFilter;
use crate::text::FileText;
use crate::AnalysisEngine;

/// Module names whose children are configured in place.
const CONTAINER_MODULES: [&str; 1] = ["TreeWalker"];

/// Module name of suppression filters.
const SUPPRESSION_FILTER: &str = "SuppressionFilter";

/// Severity a module reports at, after inheritance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ModuleSeverity {
    Report(Severity),
    Ignore,
}

impl ModuleSeverity {
    fn resolve(node: &ConfigNode, inherited: ModuleSeverity) -> Result<Self, ConfigError> {
        let Some(raw) = node.property("severity") else {
            return Ok(inherited);
        };
        if raw.trim().eq_ignore_ascii_case("ignore") {
            return Ok(ModuleSeverity::Ignore);
        }
        raw.parse()
            .map(ModuleSeverity::Report)
            .map_err(|e| ConfigError::InvalidProperty {
                module: node.name().to_string(),
                property: "severity".to_string(),
                reason: format!("{e}"),
            })
    }
}

struct ConfiguredCheck {
    check: Box<dyn Check>,
    severity: Severity,
}

/// An [`AnalysisEngine`] running registered checks over file text.
pub struct RuleEngine {
    checks: Vec<ConfiguredCheck>,
    filters: Vec<SuppressionFilter>,
    destroyed: AtomicBool,
}

impl RuleEngine {
    /// Builds an engine from a configuration tree rooted at `Checker`.
    ///
    /// Every module must resolve through `registry`; modules at severity
    /// `ignore` are validated but never run.
    pub fn configure(root: &ConfigNode, registry: &CheckRegistry) -> Result<Self, ConfigError> {
        let mut engine = Self {
            checks: Vec::new(),
            filters: Vec::new(),
            destroyed: AtomicBool::new(false),
        };
        let severity = ModuleSeverity::resolve(root, ModuleSeverity::Report(Severity::Error))?;
        engine.configure_children(root, severity, registry)?;
        tracing::debug!(
            checks = engine.checks.len(),
            filters = engine.filters.len(),
            "rule engine configured"
        );
        Ok(engine)
    }

    fn configure_children(
        &mut self,
        parent: &ConfigNode,
        inherited: ModuleSeverity,
        registry: &CheckRegistry,
    ) -> Result<(), ConfigError> {
        for node in parent.children() {
            let severity = ModuleSeverity::resolve(node, inherited)?;
            if CONTAINER_MODULES.contains(&node.name()) {
                self.configure_children(node, severity, registry)?;
                continue;
            }
            if node.name() == SUPPRESSION_FILTER {
                self.filters.push(SuppressionFilter::configure(node)?);
                continue;
            }

            let mut check = registry
                .create(node.name())
                .ok_or_else(|| ConfigError::UnknownModule(node.name().to_string()))?;
            check.configure(node)?;
            match severity {
                ModuleSeverity::Report(severity) => {
                    self.checks.push(ConfiguredCheck { check, severity })
                }
                ModuleSeverity::Ignore => {
                    tracing::debug!(module = node.name(), "module ignored by severity");
                }
            }
        }
        Ok(())
    }

    /// Returns the names of the checks that run, in configuration order.
    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.check.name()).collect()
    }

    /// Returns the suppression filters.
    pub fn filters(&self) -> &[SuppressionFilter] {
        &self.filters
    }

    fn to_diagnostic(
        configured: &ConfiguredCheck,
        source: &SourceRef,
        finding: Finding,
    ) -> Diagnostic {
        Diagnostic::new(
            source.clone(),
            finding.line,
            finding.column,
            configured.severity,
            finding.message,
        )
        .with_check(configured.check.name())
    }
}

impl AnalysisEngine for RuleEngine {
    fn process(&self, staged: &Path, source: &SourceRef) -> Result<Vec<Diagnostic>, EngineError> {
        if self.is_destroyed() {
            return Err(EngineError::Destroyed);
        }
        let text = FileText::from_file(staged).map_err(|source| EngineError::Io {
            path: staged.to_path_buf(),
            source,
        })?;

        let mut diagnostics = Vec::new();
        let mut findings = Vec::new();
        for configured in &self.checks {
            configured.check.run(&text, &mut findings);
            diagnostics.extend(
                findings
                    .drain(..)
                    .map(|finding| Self::to_diagnostic(configured, source, finding)),
            );
        }

        let mut kept = Vec::with_capacity(diagnostics.len());
        'diagnostics: for diag in diagnostics {
            for filter in &self.filters {
                if filter.is_suppressed(&diag, source.path())? {
                    continue 'diagnostics;
                }
            }
            kept.push(diag);
        }
        kept.sort_by_key(|d| (d.line, d.column));
        Ok(kept)
    }

    fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            tracing::debug!(checks = self.checks.len(), "rule engine destroyed");
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}
