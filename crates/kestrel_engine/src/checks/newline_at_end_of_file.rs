//! NewlineAtEndOfFile: a missing final line separator.

use std::fmt;
use std::str::FromStr;

use kestrel_config::{ConfigError, ConfigNode};

use super::{accept_properties, parse_property};
use crate::check::{Check, Finding};
use crate::text::FileText;

/// Which separators count as a valid file ending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NewlinePolicy {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
    /// Any of `\n`, `\r\n`, or `\r`.
    #[default]
    LfCrCrLf,
}

impl NewlinePolicy {
    fn accepts(self, content: &str) -> bool {
        match self {
            NewlinePolicy::Lf => content.ends_with('\n') && !content.ends_with("\r\n"),
            NewlinePolicy::CrLf => content.ends_with("\r\n"),
            NewlinePolicy::Cr => content.ends_with('\r'),
            NewlinePolicy::LfCrCrLf => content.ends_with(['\n', '\r']),
        }
    }
}

impl FromStr for NewlinePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lf" => Ok(NewlinePolicy::Lf),
            "crlf" => Ok(NewlinePolicy::CrLf),
            "cr" => Ok(NewlinePolicy::Cr),
            "lf_cr_crlf" => Ok(NewlinePolicy::LfCrCrLf),
            "system" if cfg!(windows) => Ok(NewlinePolicy::CrLf),
            "system" => Ok(NewlinePolicy::Lf),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// An unrecognised `lineSeparator` value.
#[derive(Debug)]
pub struct UnknownPolicy(String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not one of lf, crlf, cr, lf_cr_crlf, system",
            self.0
        )
    }
}

/// Reports non-empty files that do not end with a line separator.
#[derive(Debug, Default)]
pub struct NewlineAtEndOfFile {
    policy: NewlinePolicy,
}

impl Check for NewlineAtEndOfFile {
    fn name(&self) -> &str {
        "NewlineAtEndOfFile"
    }

    fn description(&self) -> &str {
        "file does not end with a line separator"
    }

    fn configure(&mut self, node: &ConfigNode) -> Result<(), ConfigError> {
        accept_properties(node, &["lineSeparator"])?;
        if let Some(policy) = parse_property(node, "lineSeparator")? {
            self.policy = policy;
        }
        Ok(())
    }

    fn run(&self, text: &FileText, findings: &mut Vec<Finding>) {
        let content = text.content();
        if !content.is_empty() && !self.policy.accepts(content) {
            findings.push(Finding::new(1, 0, "File does not end with a newline."));
        }
    }
}
