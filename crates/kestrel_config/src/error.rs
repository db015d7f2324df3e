//! Error types for configuration retrieval, parsing, and settings storage.

use std::path::PathBuf;

/// A configuration document could not be fetched.
///
/// Kept distinct from [`ConfigError`] so callers can report "could not
/// fetch" separately from "fetched but invalid".
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// The document file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Io {
        /// The path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The document could not be downloaded.
    #[error("failed to fetch configuration from {url}: {reason}")]
    Http {
        /// The requested URL.
        url: String,
        /// Description of the transport or status failure.
        reason: String,
    },

    /// No embedded document is registered under this name.
    #[error("no embedded configuration named '{0}'")]
    MissingResource(String),

    /// The location uses the project directory token but no project directory is known.
    #[error("cannot expand project directory token in '{0}': no project directory")]
    UnresolvedToken(String),
}

/// A configuration document was fetched but is not usable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not well-formed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// The document is well-formed but does not have the expected structure.
    #[error("invalid configuration structure: {0}")]
    Schema(String),

    /// A `${token}` placeholder has no value and no default.
    #[error("property '{0}' has not been set")]
    UnresolvedProperty(String),

    /// A module name does not match any registered check.
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    /// A module property has a value the module cannot accept.
    #[error("invalid value for property '{property}' of module '{module}': {reason}")]
    InvalidProperty {
        /// The module the property belongs to.
        module: String,
        /// The property name.
        property: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A configuration was selected that is not among the stored locations.
    #[error("configuration location is not registered: {0}")]
    UnknownLocation(String),
}

/// Errors from reading or writing persisted settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be read or written.
    #[error("settings I/O error at {path}: {source}")]
    Io {
        /// The settings file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML.
    #[error("failed to parse settings: {0}")]
    Parse(String),

    /// The settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_io_resolution() {
        let err = ResolutionError::Io {
            path: PathBuf::from("/cfg/checks.xml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("failed to read configuration /cfg/checks.xml"));
    }

    #[test]
    fn display_http() {
        let err = ResolutionError::Http {
            url: "https://example.com/checks.xml".to_string(),
            reason: "HTTP 404".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch configuration from https://example.com/checks.xml: HTTP 404"
        );
    }

    #[test]
    fn display_missing_resource() {
        let err = ResolutionError::MissingResource("/nope.xml".to_string());
        assert_eq!(err.to_string(), "no embedded configuration named '/nope.xml'");
    }

    #[test]
    fn display_unresolved_property() {
        let err = ConfigError::UnresolvedProperty("line.max".to_string());
        assert_eq!(err.to_string(), "property 'line.max' has not been set");
    }

    #[test]
    fn display_invalid_property() {
        let err = ConfigError::InvalidProperty {
            module: "LineLength".to_string(),
            property: "max".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for property 'max' of module 'LineLength': not a number"
        );
    }

    #[test]
    fn display_settings_parse() {
        let err = SettingsError::Parse("expected '='".to_string());
        assert_eq!(err.to_string(), "failed to parse settings: expected '='");
    }
}
