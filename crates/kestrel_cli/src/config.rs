//! `kestrel config`: manage stored configuration locations.

use std::error::Error;
use std::path::Path;

use kestrel_config::{ConfigurationDescriptor, ConfigurationType, ScanSettings};

use crate::setup::{self, LoadedSettings};
use crate::{ConfigAction, GlobalArgs};

/// Runs the `kestrel config` command.
pub fn run(action: &ConfigAction, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let path = setup::settings_path(global);
    let loaded = LoadedSettings::open(&path, None)?;

    match action {
        ConfigAction::List => {
            for line in list(&loaded.settings) {
                println!("{line}");
            }
        }
        ConfigAction::Add {
            location,
            kind,
            description,
            properties,
        } => {
            let descriptor = ConfigurationDescriptor::new(kind.parse()?, location, description);
            let descriptor = properties
                .iter()
                .fold(descriptor, |d, (name, value)| d.with_property(name, value));
            if add(&loaded.settings, &descriptor) {
                loaded.save()?;
                if !global.quiet {
                    eprintln!("   Added {}", descriptor.to_descriptor_string());
                }
            } else if !global.quiet {
                eprintln!("warning: {} is already stored", descriptor.to_descriptor_string());
            }
        }
        ConfigAction::Activate { location } => {
            let active = activate(&loaded.settings, location)?;
            loaded.save()?;
            if !global.quiet {
                eprintln!("   Active configuration: {active}");
            }
        }
    }
    Ok(0)
}

/// One line per stored location; the active one is marked with `*`.
fn list(settings: &ScanSettings) -> Vec<String> {
    let active = settings.active_configuration();
    let mut lines = Vec::new();
    for (index, location) in settings.configuration_locations().iter().enumerate() {
        let marker = if *location == active { '*' } else { ' ' };
        lines.push(format!("{marker} {index}: {}", location.to_descriptor_string()));
        for (name, value) in location.properties() {
            lines.push(format!("       {name}={value}"));
        }
    }
    lines
}

/// Appends `descriptor` unless an equal location is already stored.
fn add(settings: &ScanSettings, descriptor: &ConfigurationDescriptor) -> bool {
    let mut locations = settings.configuration_locations();
    if locations.contains(descriptor) {
        return false;
    }
    if descriptor.kind() == ConfigurationType::LocalFile
        && !Path::new(descriptor.location()).exists()
    {
        tracing::warn!(
            path = %descriptor.location(),
            "stored configuration file does not exist yet"
        );
    }
    locations.push(descriptor.clone());
    settings.set_configuration_locations(&locations);
    true
}

/// Activates the location with the given list index or location string.
fn activate(
    settings: &ScanSettings,
    key: &str,
) -> Result<ConfigurationDescriptor, Box<dyn Error>> {
    let locations = settings.configuration_locations();
    let found = match key.parse::<usize>() {
        Ok(index) => locations.get(index),
        Err(_) => locations.iter().find(|l| l.location() == key),
    };
    let Some(descriptor) = found else {
        return Err(format!("no stored configuration matches '{key}'").into());
    };
    settings.set_active_configuration(Some(descriptor))?;
    Ok(descriptor.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn strict() -> ConfigurationDescriptor {
        ConfigurationDescriptor::classpath("/strict_checks.xml", "Strict")
    }

    #[test]
    fn default_location_is_listed_and_active() {
        let settings = ScanSettings::new(None);
        let lines = list(&settings);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("* 0: CLASSPATH:/default_checks.xml"));
    }

    #[test]
    fn add_appends_once() {
        let settings = ScanSettings::new(None);
        assert!(add(&settings, &strict()));
        assert!(!add(&settings, &strict()));
        assert_eq!(settings.configuration_locations().len(), 2);

        let relaxed = strict().with_property("line.max", "120");
        assert!(add(&settings, &relaxed));
        let lines = list(&settings);
        assert!(lines.contains(&"       line.max=120".to_string()));
    }

    #[test]
    fn activate_by_index_or_location() {
        let settings = ScanSettings::new(None);
        add(&settings, &strict());

        assert_eq!(activate(&settings, "1").unwrap(), strict());
        assert_eq!(settings.active_configuration(), strict());
        assert!(list(&settings)[1].starts_with("* 1:"));

        activate(&settings, "/default_checks.xml").unwrap();
        assert_eq!(settings.active_configuration(), ScanSettings::default_location());

        assert!(activate(&settings, "7").is_err());
        assert!(activate(&settings, "/nowhere.xml").is_err());
    }

    #[test]
    fn run_persists_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.toml");
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            settings: Some(PathBuf::from(&path)),
        };
        let add_shared = ConfigAction::Add {
            location: "https://example.com/checks.xml".to_string(),
            kind: "http_url".to_string(),
            description: "Shared".to_string(),
            properties: vec![("line.max".to_string(), "100".to_string())],
        };
        assert_eq!(run(&add_shared, &global).unwrap(), 0);
        let activate_shared = ConfigAction::Activate {
            location: "https://example.com/checks.xml".to_string(),
        };
        assert_eq!(run(&activate_shared, &global).unwrap(), 0);

        let reloaded = LoadedSettings::open(&path, None).unwrap();
        let active = reloaded.settings.active_configuration();
        assert_eq!(active.kind(), ConfigurationType::HttpUrl);
        assert_eq!(active.properties().get("line.max").map(String::as_str), Some("100"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            settings: Some(dir.path().join("settings.toml")),
        };
        let add_ftp = ConfigAction::Add {
            location: "x.xml".to_string(),
            kind: "ftp".to_string(),
            description: String::new(),
            properties: Vec::new(),
        };
        assert!(run(&add_ftp, &global).is_err());
    }
}
