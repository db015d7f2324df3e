//! Rule configurations: identity, retrieval, parsing, and persisted settings.
//!
//! A [`ConfigurationDescriptor`] names a configuration document (embedded in
//! the binary, on local disk, or behind an HTTP URL) together with the
//! override properties its `${token}` placeholders resolve against. The
//! [`ConfigurationResolver`] turns a descriptor into document bytes, the
//! [`loader`] parses those bytes into a [`ConfigNode`] tree, and
//! [`ScanSettings`] persists the set of known descriptors through a flat
//! [`SettingsStore`].

#![warn(missing_docs)]

pub mod descriptor;
pub mod document;
pub mod error;
pub mod loader;
pub mod properties;
pub mod resolve;
pub mod scan_settings;
pub mod settings;
pub mod tokens;

pub use descriptor::{ConfigurationDescriptor, ConfigurationType};
pub use document::ConfigNode;
pub use error::{ConfigError, ResolutionError, SettingsError};
pub use loader::{load_document, load_document_from_str};
pub use properties::{expand_placeholders, MapPropertyResolver, PropertyResolver};
pub use resolve::{
    ConfigurationResolver, DefaultResolver, EmbeddedDocuments, HttpFetcher, ResolvedDocument,
    CONFIG_LOC_PROPERTY, DEFAULT_CONFIG, STRICT_CONFIG,
};
pub use scan_settings::ScanSettings;
pub use settings::{MemorySettingsStore, SettingsStore, TomlSettingsFile};
pub use tokens::{tokenise_path, untokenise_path, PROJECT_DIR_TOKEN};
