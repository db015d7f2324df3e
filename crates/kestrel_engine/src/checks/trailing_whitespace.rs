//! TrailingWhitespace: whitespace before the end of a line.

use kestrel_config::{ConfigError, ConfigNode};

use super::{accept_properties, one_based};
use crate::check::{Check, Finding};
use crate::text::FileText;

/// Reports lines ending in spaces or tabs.
#[derive(Debug, Default)]
pub struct TrailingWhitespace;

impl Check for TrailingWhitespace {
    fn name(&self) -> &str {
        "TrailingWhitespace"
    }

    fn description(&self) -> &str {
        "line has trailing whitespace"
    }

    fn configure(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        accept_properties(node, &[])
    }

    fn run(&self, text: &FileText, findings: &mut Vec<Finding>) {
        for (index, line) in text.lines().iter().enumerate() {
            let trimmed = line.trim_end_matches([' ', '\t']);
            if trimmed.len() == line.len() {
                continue;
            }
            findings.push(Finding::new(
                one_based(index),
                one_based(trimmed.chars().count()),
                "Line has trailing spaces.",
            ));
        }
    }
}
