//! Typed view over the flat settings map.
//!
//! Keys are prefix-encoded:
//!
//! | key | value |
//! |-----|-------|
//! | `location-<i>` | descriptor string `TYPE:location:description` |
//! | `property-<i>.<name>` | override property `name` of location `i` |
//! | `active-configuration` | descriptor string of the active location |
//! | `scan-test-sources` | `true` / `false` |
//! | `line-separator` | `lf`, `crlf`, `cr`, or `system` |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use kestrel_source::LineSeparator;

use crate::descriptor::{ConfigurationDescriptor, ConfigurationType};
use crate::error::{ConfigError, SettingsError};
use crate::resolve::DEFAULT_CONFIG;
use crate::settings::SettingsStore;
use crate::tokens::{tokenise_path, untokenise_path};

const LOCATION_PREFIX: &str = "location-";
const PROPERTY_PREFIX: &str = "property-";
const ACTIVE_CONFIG: &str = "active-configuration";
const SCAN_TEST_SOURCES: &str = "scan-test-sources";
const LINE_SEPARATOR: &str = "line-separator";

/// Scan settings backed by a flat string map.
///
/// Every accessor takes the same lock, so concurrent readers and writers
/// always observe a consistent map.
#[derive(Debug)]
pub struct ScanSettings {
    project_dir: Option<PathBuf>,
    storage: Mutex<BTreeMap<String, String>>,
}

impl ScanSettings {
    /// Creates empty settings for a project rooted at `project_dir`.
    pub fn new(project_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            storage: Mutex::new(BTreeMap::new()),
        }
    }

    /// Creates settings initialised from a store snapshot.
    pub fn load(store: &dyn SettingsStore, project_dir: Option<PathBuf>) -> Self {
        let settings = Self::new(project_dir);
        settings.load_state(store.get_all());
        settings
    }

    /// Writes the current state back to a store.
    pub fn save(&self, store: &dyn SettingsStore) -> Result<(), SettingsError> {
        store.replace_all(self.state())
    }

    /// Returns the built-in default location.
    pub fn default_location() -> ConfigurationDescriptor {
        ConfigurationDescriptor::classpath(DEFAULT_CONFIG, "Default checks")
    }

    /// Returns the project directory used for path tokens.
    pub fn project_dir(&self) -> Option<&Path> {
        self.project_dir.as_deref()
    }

    /// Returns a copy of the raw map.
    pub fn state(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    /// Replaces the raw map.
    pub fn load_state(&self, state: BTreeMap<String, String>) {
        *self.lock() = state;
    }

    /// Returns every stored location, with the default location first if it
    /// is not stored.
    ///
    /// Entries that fail to parse are skipped. Reading re-stores the list so
    /// local paths are persisted in tokenised form.
    pub fn configuration_locations(&self) -> Vec<ConfigurationDescriptor> {
        let mut storage = self.lock();
        let locations = self.read_locations(&storage);
        self.write_locations(&mut storage, &locations);
        locations
    }

    /// Replaces every stored location, preserving list order as indices.
    pub fn set_configuration_locations(&self, locations: &[ConfigurationDescriptor]) {
        let mut storage = self.lock();
        self.write_locations(&mut storage, locations);
    }

    /// Returns the active location.
    ///
    /// Falls back to the default location when nothing is stored, the stored
    /// value does not parse, or it no longer names a stored location.
    pub fn active_configuration(&self) -> ConfigurationDescriptor {
        let storage = self.lock();
        let Some(raw) = storage.get(ACTIVE_CONFIG) else {
            return Self::default_location();
        };
        let active = match self.parse_descriptor(raw) {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!(value = %raw, error = %e, "could not load active configuration");
                return Self::default_location();
            }
        };
        match self
            .read_locations(&storage)
            .into_iter()
            .find(|location| location.same_document(&active))
        {
            Some(location) => location,
            None => {
                tracing::info!(value = %raw, "active configuration is invalid, returning default");
                Self::default_location()
            }
        }
    }

    /// Sets or clears the active location.
    pub fn set_active_configuration(
        &self,
        location: Option<&ConfigurationDescriptor>,
    ) -> Result<(), ConfigError> {
        let mut storage = self.lock();
        let Some(location) = location else {
            storage.remove(ACTIVE_CONFIG);
            return Ok(());
        };
        let known = self
            .read_locations(&storage)
            .iter()
            .any(|stored| stored.same_document(location));
        if !known {
            return Err(ConfigError::UnknownLocation(location.to_descriptor_string()));
        }
        let stored = self.storable(location).to_descriptor_string();
        storage.insert(ACTIVE_CONFIG.to_string(), stored);
        Ok(())
    }

    /// Returns whether test sources are scanned.
    pub fn scan_test_sources(&self) -> bool {
        self.lock()
            .get(SCAN_TEST_SOURCES)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Sets whether test sources are scanned.
    pub fn set_scan_test_sources(&self, scan: bool) {
        self.lock()
            .insert(SCAN_TEST_SOURCES.to_string(), scan.to_string());
    }

    /// Returns the line separator staged files are written with.
    pub fn line_separator(&self) -> LineSeparator {
        let storage = self.lock();
        match storage.get(LINE_SEPARATOR) {
            None => LineSeparator::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "ignoring stored line separator");
                LineSeparator::default()
            }),
        }
    }

    /// Sets the line separator staged files are written with.
    pub fn set_line_separator(&self, separator: LineSeparator) {
        self.lock()
            .insert(LINE_SEPARATOR.to_string(), separator.name().to_string());
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn parse_descriptor(&self, raw: &str) -> Result<ConfigurationDescriptor, ConfigError> {
        let descriptor: ConfigurationDescriptor = raw.parse()?;
        if descriptor.kind() != ConfigurationType::LocalFile {
            return Ok(descriptor);
        }
        let location = descriptor.location().to_string();
        match untokenise_path(&location, self.project_dir()) {
            Some(expanded) => Ok(descriptor.with_location(expanded)),
            None => {
                tracing::warn!(path = %location, "could not untokenise path as project dir is unset");
                Ok(descriptor)
            }
        }
    }

    fn storable(&self, descriptor: &ConfigurationDescriptor) -> ConfigurationDescriptor {
        if descriptor.kind() != ConfigurationType::LocalFile {
            return descriptor.clone();
        }
        let tokenised = tokenise_path(descriptor.location(), self.project_dir());
        descriptor.clone().with_location(tokenised)
    }

    fn read_locations(&self, storage: &BTreeMap<String, String>) -> Vec<ConfigurationDescriptor> {
        let mut indexed = Vec::new();
        for (key, value) in storage {
            let Some(index) = key.strip_prefix(LOCATION_PREFIX) else {
                continue;
            };
            let Ok(index) = index.parse::<usize>() else {
                tracing::error!(key = %key, "could not parse location index");
                continue;
            };
            let descriptor = match self.parse_descriptor(value) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    tracing::error!(value = %value, error = %e, "could not parse location");
                    continue;
                }
            };
            let property_prefix = format!("{PROPERTY_PREFIX}{index}.");
            let properties: BTreeMap<String, String> = storage
                .iter()
                .filter_map(|(k, v)| {
                    k.strip_prefix(&property_prefix)
                        .map(|name| (name.to_string(), v.clone()))
                })
                .collect();
            indexed.push((index, descriptor.with_properties(properties)));
        }
        indexed.sort_by_key(|(index, _)| *index);

        let mut locations: Vec<ConfigurationDescriptor> =
            indexed.into_iter().map(|(_, d)| d).collect();
        let default = Self::default_location();
        if !locations.contains(&default) {
            locations.insert(0, default);
        }
        locations
    }

    fn write_locations(
        &self,
        storage: &mut BTreeMap<String, String>,
        locations: &[ConfigurationDescriptor],
    ) {
        storage.retain(|key, _| {
            !key.starts_with(LOCATION_PREFIX) && !key.starts_with(PROPERTY_PREFIX)
        });
        for (index, location) in locations.iter().enumerate() {
            storage.insert(
                format!("{LOCATION_PREFIX}{index}"),
                self.storable(location).to_descriptor_string(),
            );
            for (name, value) in location.properties() {
                storage.insert(format!("{PROPERTY_PREFIX}{index}.{name}"), value.clone());
            }
        }
    }
}
