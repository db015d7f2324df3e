//! Line separators used when materializing a buffer on disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The line separator written in place of each `\n` when a buffer is staged.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSeparator {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
}

impl LineSeparator {
    /// The separator native to the platform this binary was built for.
    pub fn system() -> Self {
        if cfg!(windows) {
            LineSeparator::CrLf
        } else {
            LineSeparator::Lf
        }
    }

    /// Returns the separator characters.
    pub fn as_str(self) -> &'static str {
        match self {
            LineSeparator::Lf => "\n",
            LineSeparator::CrLf => "\r\n",
            LineSeparator::Cr => "\r",
        }
    }

    /// Returns the settings name (`lf`, `crlf`, `cr`).
    pub fn name(self) -> &'static str {
        match self {
            LineSeparator::Lf => "lf",
            LineSeparator::CrLf => "crlf",
            LineSeparator::Cr => "cr",
        }
    }
}

impl fmt::Display for LineSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a separator name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLineSeparatorError(pub String);

impl fmt::Display for ParseLineSeparatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown line separator '{}' (expected lf, crlf, cr or system)",
            self.0
        )
    }
}

impl std::error::Error for ParseLineSeparatorError {}

impl FromStr for LineSeparator {
    type Err = ParseLineSeparatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lf" => Ok(LineSeparator::Lf),
            "crlf" => Ok(LineSeparator::CrLf),
            "cr" => Ok(LineSeparator::Cr),
            "system" => Ok(LineSeparator::system()),
            _ => Err(ParseLineSeparatorError(s.to_string())),
        }
    }
}
