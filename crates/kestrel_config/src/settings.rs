//! Flat key/value persistence for scan settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::SettingsError;

/// A store that snapshots and replaces a flat string map.
pub trait SettingsStore: Send + Sync {
    /// Returns a copy of every stored entry.
    fn get_all(&self) -> BTreeMap<String, String>;

    /// Replaces every stored entry with `snapshot`.
    fn replace_all(&self, snapshot: BTreeMap<String, String>) -> Result<(), SettingsError>;
}

/// An in-memory [`SettingsStore`].
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    /// Creates a store with the given initial entries.
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_all(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_all(&self, snapshot: BTreeMap<String, String>) -> Result<(), SettingsError> {
        *self.entries.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    settings: BTreeMap<String, String>,
}

/// A [`SettingsStore`] persisted as a TOML file with a single `[settings]` table.
///
/// A missing file reads as empty. Writes replace the whole file.
#[derive(Debug)]
pub struct TomlSettingsFile {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl TomlSettingsFile {
    /// Opens (or prepares to create) the settings file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let doc: SettingsDocument =
                    toml::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))?;
                doc.settings
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsFile {
    fn get_all(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_all(&self, snapshot: BTreeMap<String, String>) -> Result<(), SettingsError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let doc = SettingsDocument {
            settings: snapshot,
        };
        let text =
            toml::to_string_pretty(&doc).map_err(|e| SettingsError::Serialize(e.to_string()))?;
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&self.path, text).map_err(io_err)?;
        *entries = doc.settings;
        tracing::debug!(path = %self.path.display(), entries = entries.len(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("location-0".to_string(), "CLASSPATH:/default_checks.xml:Default".to_string()),
            ("scan-test-sources".to_string(), "true".to_string()),
        ])
    }

    #[test]
    fn memory_store_replaces() {
        let store = MemorySettingsStore::default();
        assert!(store.get_all().is_empty());
        store.replace_all(sample()).unwrap();
        assert_eq!(store.get_all(), sample());
        store.replace_all(BTreeMap::new()).unwrap();
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn toml_file_missing_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettingsFile::open(dir.path().join("kestrel.toml")).unwrap();
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn toml_file_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/kestrel.toml");
        TomlSettingsFile::open(&path).unwrap().replace_all(sample()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[settings]"));

        let reopened = TomlSettingsFile::open(&path).unwrap();
        assert_eq!(reopened.get_all(), sample());
    }

    #[test]
    fn toml_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kestrel.toml");
        std::fs::write(&path, "[settings\nbroken").unwrap();
        assert!(matches!(TomlSettingsFile::open(&path), Err(SettingsError::Parse(_))));
    }
}
