//! Suppression documents: rules that drop matching diagnostics.
//!
//! ```xml
//! <suppressions>
//!   <suppress checks="LineLength|FileLength" files="Generated\.java$" lines="1,10-20"/>
//! </suppressions>
//! ```

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use kestrel_config::{ConfigError, ConfigNode};
use kestrel_diagnostics::Diagnostic;
use regex::Regex;
use roxmltree::{Document, ParsingOptions};

use crate::error::EngineError;

/// One `<suppress>` element.
#[derive(Debug)]
struct Suppression {
    checks: Option<Regex>,
    message: Option<Regex>,
    files: Option<Regex>,
    lines: Option<Vec<RangeInclusive<u32>>>,
    columns: Option<Vec<RangeInclusive<u32>>>,
}

impl Suppression {
    fn matches(&self, diag: &Diagnostic, source_path: &str) -> bool {
        let matches_re =
            |re: &Option<Regex>, text: &str| re.as_ref().map_or(true, |re| re.is_match(text));
        let in_ranges = |ranges: &Option<Vec<RangeInclusive<u32>>>, value: u32| {
            ranges
                .as_ref()
                .map_or(true, |ranges| ranges.iter().any(|r| r.contains(&value)))
        };
        matches_re(&self.checks, &diag.check)
            && matches_re(&self.message, &diag.message)
            && matches_re(&self.files, source_path)
            && in_ranges(&self.lines, diag.line)
            && in_ranges(&self.columns, diag.column)
    }
}

/// A `SuppressionFilter` module.
///
/// The document is read on first use rather than when the engine is built,
/// and the outcome (including a failure) is kept for the engine's lifetime.
#[derive(Debug)]
pub struct SuppressionFilter {
    file: PathBuf,
    optional: bool,
    loaded: OnceLock<Result<Vec<Suppression>, String>>,
}

impl SuppressionFilter {
    /// Creates a filter from its `<module name="SuppressionFilter">` node.
    pub fn configure(node: &ConfigNode) -> Result<Self, ConfigError> {
        let file = node.property("file").ok_or_else(|| ConfigError::InvalidProperty {
            module: node.name().to_string(),
            property: "file".to_string(),
            reason: "a suppression file is required".to_string(),
        })?;
        let optional = match node.property("optional") {
            None => false,
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidProperty {
                module: node.name().to_string(),
                property: "optional".to_string(),
                reason: format!("'{raw}' is not a boolean"),
            })?,
        };
        Ok(Self::new(file, optional))
    }

    /// Creates a filter reading `file`.
    pub fn new(file: impl Into<PathBuf>, optional: bool) -> Self {
        Self {
            file: file.into(),
            optional,
            loaded: OnceLock::new(),
        }
    }

    /// Returns the suppression document path.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Returns `true` if `diag` for the file at `source_path` is suppressed.
    pub fn is_suppressed(
        &self,
        diag: &Diagnostic,
        source_path: &Path,
    ) -> Result<bool, EngineError> {
        let suppressions = self
            .loaded
            .get_or_init(|| load_suppressions(&self.file, self.optional))
            .as_ref()
            .map_err(|reason| EngineError::Suppression(reason.clone()))?;
        let path = source_path.to_string_lossy();
        Ok(suppressions.iter().any(|s| s.matches(diag, &path)))
    }
}

fn load_suppressions(file: &Path, optional: bool) -> Result<Vec<Suppression>, String> {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && optional => {
            tracing::debug!(path = %file.display(), "optional suppression file not found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(format!("cannot read {}: {e}", file.display())),
    };
    let parsed = parse_suppressions(&text).map_err(|e| format!("{}: {e}", file.display()))?;
    tracing::debug!(path = %file.display(), rules = parsed.len(), "loaded suppressions");
    Ok(parsed)
}

fn parse_suppressions(text: &str) -> Result<Vec<Suppression>, String> {
    let opts = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, opts).map_err(|e| e.to_string())?;
    let root = doc.root_element();
    if root.tag_name().name() != "suppressions" {
        return Err(format!(
            "expected <suppressions>, found <{}>",
            root.tag_name().name()
        ));
    }

    let mut suppressions = Vec::new();
    for element in root.children().filter(|n| n.is_element()) {
        if element.tag_name().name() != "suppress" {
            continue;
        }
        let pattern = |attr: &str| {
            element
                .attribute(attr)
                .map(|raw| Regex::new(raw).map_err(|e| format!("invalid {attr} pattern: {e}")))
                .transpose()
        };
        let ranges = |attr: &str| element.attribute(attr).map(parse_ranges).transpose();
        let suppression = Suppression {
            checks: pattern("checks")?,
            message: pattern("message")?,
            files: pattern("files")?,
            lines: ranges("lines")?,
            columns: ranges("columns")?,
        };
        if suppression.checks.is_none() && suppression.message.is_none() {
            return Err("<suppress> needs a checks or message pattern".to_string());
        }
        suppressions.push(suppression);
    }
    Ok(suppressions)
}

/// Parses `1,4-9, 12` into inclusive ranges.
fn parse_ranges(raw: &str) -> Result<Vec<RangeInclusive<u32>>, String> {
    let number = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid number '{}' in '{raw}'", s.trim()))
    };
    raw.split(',')
        .map(|part| match part.split_once('-') {
            Some((start, end)) => Ok(number(start)?..=number(end)?),
            None => number(part).map(|n| n..=n),
        })
        .collect()
}
