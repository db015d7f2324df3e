//! FileTabCharacter: tab characters in source text.

use kestrel_config::{ConfigError, ConfigNode};

use super::{accept_properties, one_based, parse_property};
use crate::check::{Check, Finding};
use crate::text::FileText;

/// Reports tab characters.
///
/// Only the first tab in the file is reported unless `eachLine` is set, in
/// which case the first tab on every line is.
#[derive(Debug, Default)]
pub struct FileTabCharacter {
    each_line: bool,
}

impl Check for FileTabCharacter {
    fn name(&self) -> &str {
        "FileTabCharacter"
    }

    fn description(&self) -> &str {
        "file contains tab characters"
    }

    fn configure(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        accept_properties(node, &["eachLine"])?;
        self.each_line = parse_property(node, "eachLine")?.unwrap_or(false);
        Ok(())
    }

    fn run(&self, text: &FileText, findings: &mut Vec<Finding>) {
        for (index, line) in text.lines().iter().enumerate() {
            let Some(column) = line.chars().position(|c| c == '\t') else {
                continue;
            };
            if self.each_line {
                findings.push(Finding::new(
                    one_based(index),
                    one_based(column),
                    "Line contains a tab character.",
                ));
            } else {
                findings.push(Finding::new(
                    one_based(index),
                    one_based(column),
                    "File contains tab characters (this is the first instance).",
                ));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "class A {\n\tint a;\n  \tint b;\n}\n";

    fn run(check: &FileTabCharacter) -> Vec<Finding> {
        let mut findings = Vec::new();
        check.run(&FileText::new("A.java", TEXT.to_string()), &mut findings);
        findings
    }

    #[test]
    fn first_instance_only() {
        let findings = run(&FileTabCharacter::default());
        assert_eq!(
            findings,
            vec![Finding::new(
                2,
                1,
                "File contains tab characters (this is the first instance)."
            )]
        );
    }

    #[test]
    fn each_line() {
        let mut check = FileTabCharacter::default();
        check
            .configure(&ConfigNode::new("FileTabCharacter").with_property("eachLine", "true"))
            .unwrap();
        let findings = run(&check);
        assert_eq!(findings.len(), 2);
        assert_eq!((findings[1].line, findings[1].column), (3, 3));
    }

    #[test]
    fn non_boolean_rejected() {
        let mut check = FileTabCharacter::default();
        let node = ConfigNode::new("FileTabCharacter").with_property("eachLine", "yes");
        assert!(check.configure(&node).is_err());
    }
}
