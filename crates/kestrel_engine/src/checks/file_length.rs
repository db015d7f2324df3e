//! FileLength: files with too many lines.

use kestrel_config::{ConfigError, ConfigNode};

use super::{accept_properties, parse_property};
use crate::check::{Check, Finding};
use crate::text::FileText;

/// Reports files longer than `max` lines.
#[derive(Debug)]
pub struct FileLength {
    max: usize,
}

impl FileLength {
    /// Default maximum number of lines.
    pub const DEFAULT_MAX: usize = 2000;
}

impl Default for FileLength {
    fn default() -> Self {
        Self {
            max: Self::DEFAULT_MAX,
        }
    }
}

impl Check for FileLength {
    fn name(&self) -> &str {
        "FileLength"
    }

    fn description(&self) -> &str {
        "file exceeds the maximum number of lines"
    }

    fn configure(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        accept_properties(node, &["max"])?;
        if let Some(max) = parse_property(node, "max")? {
            self.max = max;
        }
        Ok(())
    }

    fn run(&self, text: &FileText, findings: &mut Vec<Finding>) {
        let count = text.line_count();
        if count > self.max {
            findings.push(Finding::new(
                1,
                0,
                format!("File length is {count} lines (max allowed is {}).", self.max),
            ));
        }
    }
}
