//! Built-in checks.
//!
//! Every check reads its properties from its `<module>` node. The
//! `severity` and `id` properties are handled by the engine and accepted on
//! every module; anything else a check does not know is rejected.

mod file_length;
mod file_tab_character;
mod line_length;
mod newline_at_end_of_file;
mod regexp_singleline;
mod trailing_whitespace;

pub use file_length::FileLength;
pub use file_tab_character::FileTabCharacter;
pub use line_length::LineLength;
pub use newline_at_end_of_file::{NewlineAtEndOfFile, NewlinePolicy, UnknownPolicy};
pub use regexp_singleline::RegexpSingleline;
pub use trailing_whitespace::TrailingWhitespace;

use std::fmt::Display;
use std::str::FromStr;

use kestrel_config::{ConfigError, ConfigNode};

use crate::check::CheckRegistry;

/// Properties every module accepts.
const COMMON_PROPERTIES: [&str; 2] = ["severity", "id"];

/// Adds every built-in check to `registry`.
pub fn register_builtin_checks(registry: &mut CheckRegistry) {
    registry.register("LineLength", || Box::new(LineLength::default()));
    registry.register("FileTabCharacter", || Box::new(FileTabCharacter::default()));
    registry.register("FileLength", || Box::new(FileLength::default()));
    registry.register("TrailingWhitespace", || Box::new(TrailingWhitespace));
    registry.register("NewlineAtEndOfFile", || Box::new(NewlineAtEndOfFile::default()));
    registry.register("RegexpSingleline", || Box::new(RegexpSingleline::default()));
}

/// Rejects properties outside `known` and the common set.
fn accept_properties(node: &ConfigNode, known: &[&str]) -> Result<(), ConfigError> {
    for name in node.properties().keys() {
        if !known.contains(&name.as_str()) && !COMMON_PROPERTIES.contains(&name.as_str()) {
            return Err(ConfigError::InvalidProperty {
                module: node.name().to_string(),
                property: name.clone(),
                reason: "no such property".to_string(),
            });
        }
    }
    Ok(())
}

/// Parses an optional property with `FromStr`.
fn parse_property<T>(node: &ConfigNode, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    node.property(name)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidProperty {
                module: node.name().to_string(),
                property: name.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Compiles an optional regex property.
fn regex_property(
    node: &ConfigNode,
    name: &str,
    case_insensitive: bool,
) -> Result<Option<regex::Regex>, ConfigError> {
    node.property(name)
        .map(|raw| {
            regex::RegexBuilder::new(raw)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|e| ConfigError::InvalidProperty {
                    module: node.name().to_string(),
                    property: name.to_string(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

/// Converts a 0-based index to a 1-based line or column number.
fn one_based(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}
