//! Diagnostic rendering for human-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use kestrel_source::SourceDb;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// Renders diagnostics in a compiler-style terminal format.
///
/// Produces output like:
/// ```text
/// warning: Line is longer than 80 characters (found 93). [LineLength]
///   --> src/Main.java:12
///    |
/// 12 |     private static final String GREETING = "...";
///    |
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn severity_label(&self, severity: Severity) -> String {
        if !self.color {
            return severity.to_string();
        }
        let code = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Info => "36",
        };
        format!("\x1b[1;{code}m{severity}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();

        out.push_str(&format!("{}: {}", self.severity_label(diag.severity), diag.message));
        if !diag.check.is_empty() {
            out.push_str(&format!(" [{}]", diag.check));
        }
        out.push('\n');
        out.push_str(&format!("  --> {}\n", diag.location()));

        let Some(line_content) = source_db
            .get(&diag.source)
            .and_then(|buffer| buffer.line(diag.line))
        else {
            return out;
        };

        let line_num = diag.line.to_string();
        let padding = " ".repeat(line_num.len());
        out.push_str(&format!("{padding} |\n"));
        out.push_str(&format!("{line_num} | {line_content}\n"));
        if diag.column > 0 {
            let col_padding = " ".repeat(diag.column as usize - 1);
            out.push_str(&format!("{padding} | {col_padding}^\n"));
        } else {
            out.push_str(&format!("{padding} |\n"));
        }

        out
    }
}
