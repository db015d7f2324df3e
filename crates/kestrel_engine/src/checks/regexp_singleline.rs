//! RegexpSingleline: lines matching a forbidden pattern.

use kestrel_config::{ConfigError, ConfigNode};
use regex::Regex;

use super::{accept_properties, one_based, parse_property, regex_property};
use crate::check::{Check, Finding};
use crate::text::FileText;

/// Reports every line matching `format`.
///
/// `message` replaces the default text and `ignoreCase` makes the match
/// case-insensitive. The column is the first character of the match.
#[derive(Debug, Default)]
pub struct RegexpSingleline {
    format: Option<Regex>,
    message: Option<String>,
}

impl Check for RegexpSingleline {
    fn name(&self) -> &str {
        "RegexpSingleline"
    }

    fn description(&self) -> &str {
        "line matches a forbidden pattern"
    }

    fn configure(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        accept_properties(node, &["format", "message", "ignoreCase"])?;
        let ignore_case = parse_property(node, "ignoreCase")?.unwrap_or(false);
        let format = regex_property(node, "format", ignore_case)?.ok_or_else(|| {
            ConfigError::InvalidProperty {
                module: node.name().to_string(),
                property: "format".to_string(),
                reason: "a pattern is required".to_string(),
            }
        })?;
        self.format = Some(format);
        self.message = node.property("message").map(str::to_string);
        Ok(())
    }

    fn run(&self, text: &FileText, findings: &mut Vec<Finding>) {
        let Some(format) = &self.format else {
            return;
        };
        for (index, line) in text.lines().iter().enumerate() {
            let Some(found) = format.find(line) else {
                continue;
            };
            let column = line[..found.start()].chars().count();
            let message = match &self.message {
                Some(message) => message.clone(),
                None => format!("Line matches the illegal pattern '{}'.", format.as_str()),
            };
            findings.push(Finding::new(one_based(index), one_based(column), message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(node: ConfigNode) -> RegexpSingleline {
        let mut check = RegexpSingleline::default();
        check.configure(&node).unwrap();
        check
    }

    fn run(check: &RegexpSingleline, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        check.run(&FileText::new("A.java", content.to_string()), &mut findings);
        findings
    }

    #[test]
    fn default_message_and_column() {
        let check = configured(ConfigNode::new("RegexpSingleline").with_property("format", "TODO"));
        let findings = run(&check, "ok\n  // TODO fix\n");
        assert_eq!(
            findings,
            vec![Finding::new(2, 6, "Line matches the illegal pattern 'TODO'.")]
        );
    }

    #[test]
    fn custom_message_and_ignore_case() {
        let check = configured(
            ConfigNode::new("RegexpSingleline")
                .with_property("format", "system\\.out")
                .with_property("message", "no console output")
                .with_property("ignoreCase", "true"),
        );
        let findings = run(&check, "System.out.println(1);\n");
        assert_eq!(findings, vec![Finding::new(1, 1, "no console output")]);
    }

    #[test]
    fn format_is_required() {
        let mut check = RegexpSingleline::default();
        let err = check.configure(&ConfigNode::new("RegexpSingleline")).unwrap_err();
        assert!(err.to_string().contains("a pattern is required"));
    }
}
