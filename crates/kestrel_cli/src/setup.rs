//! Shared command setup: settings, descriptors, and build contexts.

use std::path::{Component, Path, PathBuf};

use kestrel_cache::{BuildContext, ModuleContext};
use kestrel_config::{ConfigurationDescriptor, ScanSettings, SettingsError, TomlSettingsFile};
use kestrel_source::LineSeparator;

use crate::{CheckArgs, GlobalArgs};

/// Settings file used by `kestrel config` when `--settings` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = ".kestrel/settings.toml";

/// Parses a `name=value` override property.
pub fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, found '{raw}'")),
    }
}

/// Stored settings together with the file they came from.
pub struct LoadedSettings {
    /// The settings file.
    pub file: TomlSettingsFile,
    /// The settings read from it.
    pub settings: ScanSettings,
}

impl LoadedSettings {
    /// Opens `path` and reads its settings.
    pub fn open(path: &Path, project_dir: Option<PathBuf>) -> Result<Self, SettingsError> {
        let file = TomlSettingsFile::open(path)?;
        let settings = ScanSettings::load(&file, project_dir);
        Ok(Self { file, settings })
    }

    /// Writes the settings back to their file.
    pub fn save(&self) -> Result<(), SettingsError> {
        self.settings.save(&self.file)
    }
}

/// Returns the settings file to use: `--settings` or the default location.
pub fn settings_path(global: &GlobalArgs) -> PathBuf {
    global
        .settings
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

/// Returns the embedded resource name for a `--config-builtin` value.
pub fn builtin_resource(name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{name}")
    }
}

/// Picks the configuration to check with.
///
/// An explicit `--config-*` flag wins; otherwise the active stored location,
/// otherwise the default. `-p` properties are layered on top.
pub fn resolve_descriptor(
    args: &CheckArgs,
    settings: Option<&ScanSettings>,
) -> ConfigurationDescriptor {
    let base = if let Some(path) = &args.config_file {
        ConfigurationDescriptor::local_file(path.clone(), path.clone())
    } else if let Some(url) = &args.config_url {
        ConfigurationDescriptor::http_url(url.clone(), url.clone())
    } else if let Some(name) = &args.config_builtin {
        ConfigurationDescriptor::classpath(builtin_resource(name), name.clone())
    } else {
        settings
            .map(ScanSettings::active_configuration)
            .unwrap_or_else(ScanSettings::default_location)
    };
    args.properties
        .iter()
        .fold(base, |descriptor, (name, value)| descriptor.with_property(name, value))
}

/// Picks the staging line separator: flag, then settings, then the platform's.
pub fn line_separator(
    args: &CheckArgs,
    settings: Option<&ScanSettings>,
) -> Result<LineSeparator, String> {
    match (&args.line_separator, settings) {
        (Some(raw), _) => raw.parse().map_err(|e| format!("{e}")),
        (None, Some(settings)) => Ok(settings.line_separator()),
        (None, None) => Ok(LineSeparator::system()),
    }
}

/// Returns `true` if the path lies under a `test` or `tests` directory.
pub fn is_test_source(path: &Path) -> bool {
    path.parent().is_some_and(|dir| {
        dir.components().any(|c| {
            matches!(c, Component::Normal(name) if name == "test" || name == "tests")
        })
    })
}

/// Builds the context relative suppression paths are anchored against.
pub fn build_context(args: &CheckArgs) -> BuildContext {
    let context = BuildContext::new(args.project_dir.clone());
    if args.module_roots.is_empty() {
        return context;
    }
    let module = args
        .module_roots
        .iter()
        .fold(ModuleContext::new("cli"), |module, root| {
            module.with_content_root(root.clone())
        });
    context.with_module(module)
}
