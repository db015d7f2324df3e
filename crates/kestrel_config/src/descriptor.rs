//! Configuration descriptors: the identity of one rule configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::ConfigError;

/// Where a configuration document lives.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ConfigurationType {
    /// A document embedded in the binary, addressed by resource name.
    Classpath,
    /// A document on local disk.
    LocalFile,
    /// A document downloaded over HTTP and cached locally.
    HttpUrl,
}

impl ConfigurationType {
    /// Returns the persisted name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigurationType::Classpath => "CLASSPATH",
            ConfigurationType::LocalFile => "LOCAL_FILE",
            ConfigurationType::HttpUrl => "HTTP_URL",
        }
    }
}

impl fmt::Display for ConfigurationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigurationType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CLASSPATH" => Ok(ConfigurationType::Classpath),
            "LOCAL_FILE" | "FILE" => Ok(ConfigurationType::LocalFile),
            "HTTP_URL" => Ok(ConfigurationType::HttpUrl),
            other => Err(ConfigError::Parse(format!(
                "unknown configuration type '{other}'"
            ))),
        }
    }
}

/// Identity of one rule configuration plus its override properties.
///
/// Two descriptors are equal, and hash equally, when their type, location,
/// and full property map match. The description is display-only and takes
/// no part in equality, so descriptors can be used directly as cache keys.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigurationDescriptor {
    kind: ConfigurationType,
    location: String,
    description: String,
    properties: BTreeMap<String, String>,
}

impl ConfigurationDescriptor {
    /// Creates a descriptor with no override properties.
    pub fn new(
        kind: ConfigurationType,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            location: location.into(),
            description: description.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Creates a descriptor for an embedded document.
    pub fn classpath(location: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ConfigurationType::Classpath, location, description)
    }

    /// Creates a descriptor for a local file.
    pub fn local_file(location: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ConfigurationType::LocalFile, location, description)
    }

    /// Creates a descriptor for a document served over HTTP.
    pub fn http_url(location: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ConfigurationType::HttpUrl, location, description)
    }

    /// Adds or replaces one override property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Replaces the whole override property map.
    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// Returns where the document lives.
    pub fn kind(&self) -> ConfigurationType {
        self.kind
    }

    /// Returns the location string (resource name, path, or URL).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the override properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Returns the same descriptor with a different location.
    pub(crate) fn with_location(mut self, location: String) -> Self {
        self.location = location;
        self
    }

    /// Returns `true` if both descriptors name the same document,
    /// regardless of override properties.
    pub fn same_document(&self, other: &ConfigurationDescriptor) -> bool {
        self.kind == other.kind && self.location == other.location
    }

    /// Encodes `TYPE:location:description` for persistence.
    pub fn to_descriptor_string(&self) -> String {
        format!("{}:{}:{}", self.kind, self.location, self.description)
    }
}

impl PartialEq for ConfigurationDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.location == other.location
            && self.properties == other.properties
    }
}

impl Eq for ConfigurationDescriptor {}

impl Hash for ConfigurationDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.location.hash(state);
        self.properties.hash(state);
    }
}

impl fmt::Display for ConfigurationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            f.write_str(&self.location)
        } else {
            f.write_str(&self.description)
        }
    }
}

/// Parses `TYPE:location:description`.
///
/// The type ends at the first `:` and the description starts after the last
/// one, so locations may contain colons (URLs, drive letters).
impl FromStr for ConfigurationDescriptor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| ConfigError::Parse(format!("malformed descriptor '{s}'")))?;
        let (location, description) = rest
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::Parse(format!("malformed descriptor '{s}'")))?;
        if location.is_empty() {
            return Err(ConfigError::Parse(format!(
                "descriptor '{s}' has an empty location"
            )));
        }
        Ok(Self::new(kind.parse()?, location, description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn description_excluded_from_equality() {
        let a = ConfigurationDescriptor::local_file("/cfg/a.xml", "Team rules");
        let b = ConfigurationDescriptor::local_file("/cfg/a.xml", "Renamed");
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn properties_take_part_in_equality() {
        let a = ConfigurationDescriptor::local_file("/cfg/a.xml", "x").with_property("max", "100");
        let b = ConfigurationDescriptor::local_file("/cfg/a.xml", "x").with_property("max", "120");
        assert_ne!(a, b);
        assert!(a.same_document(&b));
    }

    #[test]
    fn kind_takes_part_in_equality() {
        let a = ConfigurationDescriptor::classpath("/a.xml", "");
        let b = ConfigurationDescriptor::local_file("/a.xml", "");
        assert_ne!(a, b);
    }

    #[test]
    fn parse_url_with_colons() {
        let d: ConfigurationDescriptor = "HTTP_URL:https://example.com:8080/checks.xml:Remote"
            .parse()
            .unwrap();
        assert_eq!(d.kind(), ConfigurationType::HttpUrl);
        assert_eq!(d.location(), "https://example.com:8080/checks.xml");
        assert_eq!(d.description(), "Remote");
    }

    #[test]
    fn parse_empty_description() {
        let d: ConfigurationDescriptor = "CLASSPATH:/default_checks.xml:".parse().unwrap();
        assert_eq!(d.location(), "/default_checks.xml");
        assert_eq!(d.description(), "");
        assert_eq!(d.to_string(), "/default_checks.xml");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("CLASSPATH".parse::<ConfigurationDescriptor>().is_err());
        assert!("CLASSPATH:/a.xml".parse::<ConfigurationDescriptor>().is_err());
        assert!("NOPE:/a.xml:d".parse::<ConfigurationDescriptor>().is_err());
        assert!("LOCAL_FILE::d".parse::<ConfigurationDescriptor>().is_err());
    }

    #[test]
    fn descriptor_string_roundtrip() {
        let d = ConfigurationDescriptor::local_file("C:/work/checks.xml", "Windows");
        let s = d.to_descriptor_string();
        assert_eq!(s, "LOCAL_FILE:C:/work/checks.xml:Windows");
        let back: ConfigurationDescriptor = s.parse().unwrap();
        assert_eq!(back, d);
        assert_eq!(back.description(), "Windows");
    }

    #[test]
    fn legacy_file_type_name() {
        assert_eq!(
            "file".parse::<ConfigurationType>().unwrap(),
            ConfigurationType::LocalFile
        );
    }
}
