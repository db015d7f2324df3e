//! LineLength: lines longer than a maximum.

use kestrel_config::{ConfigError, ConfigNode};
use regex::Regex;

use super::{accept_properties, one_based, parse_property, regex_property};
use crate::check::{Check, Finding};
use crate::text::FileText;

/// Reports lines with more than `max` characters.
///
/// Lines matching `ignorePattern` are skipped. Findings cover the whole line.
#[derive(Debug)]
pub struct LineLength {
    max: usize,
    ignore: Option<Regex>,
}

impl LineLength {
    /// Default maximum line length.
    pub const DEFAULT_MAX: usize = 80;
}

impl Default for LineLength {
    fn default() -> Self {
        Self {
            max: Self::DEFAULT_MAX,
            ignore: None,
        }
    }
}

impl Check for LineLength {
    fn name(&self) -> &str {
        "LineLength"
    }

    fn description(&self) -> &str {
        "line exceeds the maximum length"
    }

    fn configure(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        accept_properties(node, &["max", "ignorePattern"])?;
        if let Some(max) = parse_property(node, "max")? {
            self.max = max;
        }
        self.ignore = regex_property(node, "ignorePattern", false)?;
        Ok(())
    }

    fn run(&self, text: &FileText, findings: &mut Vec<Finding>) {
        for (index, line) in text.lines().iter().enumerate() {
            let len = line.chars().count();
            if len <= self.max {
                continue;
            }
            if self.ignore.as_ref().is_some_and(|re| re.is_match(line)) {
                continue;
            }
            findings.push(Finding::new(
                one_based(index),
                0,
                format!("Line is longer than {} characters (found {len}).", self.max),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(check: &LineLength, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        check.run(&FileText::new("A.java", content.to_string()), &mut findings);
        findings
    }

    #[test]
    fn default_max_is_80() {
        let check = LineLength::default();
        let ok = "x".repeat(80);
        let long = "y".repeat(81);
        let findings = run(&check, &format!("{ok}\n{long}\n"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[0].column, 0);
        assert_eq!(findings[0].message, "Line is longer than 80 characters (found 81).");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let mut check = LineLength::default();
        check.configure(&ConfigNode::new("LineLength").with_property("max", "3")).unwrap();
        assert!(run(&check, "äöü\n").is_empty());
    }

    #[test]
    fn ignore_pattern_skips_lines() {
        let mut check = LineLength::default();
        let node = ConfigNode::new("LineLength")
            .with_property("max", "10")
            .with_property("ignorePattern", "^import ");
        check.configure(&node).unwrap();
        let findings = run(&check, "import a.b.c.d.e.f;\nint averyveryverylongname;\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn invalid_max_rejected() {
        let mut check = LineLength::default();
        let node = ConfigNode::new("LineLength").with_property("max", "-1");
        assert!(check.configure(&node).is_err());
    }
}
