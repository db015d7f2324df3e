//! The check capability and the registry checks are created from.

use std::collections::BTreeMap;
use std::fmt;

use kestrel_config::{ConfigError, ConfigNode};

use crate::checks;
use crate::text::FileText;

/// One finding produced by a check, before severity and source are attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column, or 0 for the whole line.
    pub column: u32,
    /// Human-readable message.
    pub message: String,
}

impl Finding {
    /// Creates a finding.
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// A single rule applied to the text of one file.
///
/// A check is configured once from its `<module>` node and is then run
/// read-only, possibly from several threads at once.
pub trait Check: Send + Sync {
    /// Returns the module name this check is registered under.
    fn name(&self) -> &str;

    /// Returns a human-readable description of what this check reports.
    fn description(&self) -> &str;

    /// Applies the module's properties.
    fn configure(&mut self, node: &ConfigNode) -> Result<(), ConfigError>;

    /// Appends findings for `text`.
    fn run(&self, text: &FileText, findings: &mut Vec<Finding>);
}

type CheckFactory = Box<dyn Fn() -> Box<dyn Check> + Send + Sync>;

/// Module names mapped to check factories.
///
/// An engine is only ever built from the checks the registry handed to the
/// build provides.
#[derive(Default)]
pub struct CheckRegistry {
    factories: BTreeMap<String, CheckFactory>,
}

impl CheckRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in check.
    pub fn with_builtin_checks() -> Self {
        let mut registry = Self::new();
        checks::register_builtin_checks(&mut registry);
        registry
    }

    /// Registers a factory under `name`, replacing any existing one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Check> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Creates a fresh, unconfigured check for a module name.
    ///
    /// A dotted name is matched by its last segment, and a trailing `Check`
    /// is optional: `LineLength`, `LineLengthCheck`, and
    /// `com.example.LineLengthCheck` all find `LineLength`.
    pub fn create(&self, module: &str) -> Option<Box<dyn Check>> {
        self.factory(module).map(|factory| factory())
    }

    /// Returns `true` if a module name resolves to a registered check.
    pub fn contains(&self, module: &str) -> bool {
        self.factory(module).is_some()
    }

    /// Returns every registered name in order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered checks.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn factory(&self, module: &str) -> Option<&CheckFactory> {
        let short = module.rsplit('.').next().unwrap_or(module);
        [module, short]
            .into_iter()
            .flat_map(|name| [Some(name), name.strip_suffix("Check")])
            .flatten()
            .find_map(|name| self.factories.get(name))
    }
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("checks", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Check for Noop {
        fn name(&self) -> &str {
            "Noop"
        }
        fn description(&self) -> &str {
            "reports nothing"
        }
        fn configure(&mut self, _node: &ConfigNode) -> Result<(), ConfigError> {
            Ok(())
        }
        fn run(&self, _text: &FileText, _findings: &mut Vec<Finding>) {}
    }

    #[test]
    fn builtin_registry_has_all_checks() {
        let registry = CheckRegistry::with_builtin_checks();
        assert_eq!(
            registry.names(),
            [
                "FileLength",
                "FileTabCharacter",
                "LineLength",
                "NewlineAtEndOfFile",
                "RegexpSingleline",
                "TrailingWhitespace"
            ]
        );
    }

    #[test]
    fn name_variants_resolve() {
        let registry = CheckRegistry::with_builtin_checks();
        assert!(registry.contains("LineLength"));
        assert!(registry.contains("LineLengthCheck"));
        assert!(registry.contains("com.puppycrawl.tools.checkstyle.checks.sizes.LineLengthCheck"));
        assert!(!registry.contains("LineLen"));
        assert_eq!(registry.create("FileLengthCheck").unwrap().name(), "FileLength");
    }

    #[test]
    fn custom_check_registration() {
        let mut registry = CheckRegistry::new();
        assert!(registry.is_empty());
        registry.register("Noop", || Box::new(Noop));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.create("Noop").unwrap().description(), "reports nothing");
    }

    #[test]
    fn debug_lists_names() {
        let mut registry = CheckRegistry::new();
        registry.register("Noop", || Box::new(Noop));
        assert_eq!(format!("{registry:?}"), "CheckRegistry { checks: [\"Noop\"] }");
    }
}
