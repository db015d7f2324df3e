//! Where a build happens: the project and module the engine is built for.

use std::path::{Path, PathBuf};

/// The module a scan belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleContext {
    /// Module name, for logging.
    pub name: String,
    /// Source roots of the module, in priority order.
    pub content_roots: Vec<PathBuf>,
    /// The file describing the module (a build script or module file).
    pub descriptor_file: Option<PathBuf>,
}

impl ModuleContext {
    /// Creates a module with no roots.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a content root.
    pub fn with_content_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.content_roots.push(root.into());
        self
    }

    /// Sets the module descriptor file.
    pub fn with_descriptor_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.descriptor_file = Some(file.into());
        self
    }
}

/// Context passed to every engine build.
///
/// Used to anchor relative paths found inside configuration documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildContext {
    /// The project's base directory.
    pub project_base: Option<PathBuf>,
    /// The module being scanned, if any.
    pub module: Option<ModuleContext>,
}

impl BuildContext {
    /// Creates a context for a project.
    pub fn new(project_base: Option<PathBuf>) -> Self {
        Self {
            project_base,
            module: None,
        }
    }

    /// Sets the module being scanned.
    pub fn with_module(mut self, module: ModuleContext) -> Self {
        self.module = Some(module);
        self
    }

    /// Returns the directories relative suppression paths are searched in.
    ///
    /// Order: the document's own directory, each module content root, the
    /// module descriptor file's directory, then the project base.
    pub fn search_dirs(&self, document_base: Option<&Path>) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        dirs.extend(document_base.map(Path::to_path_buf));
        if let Some(module) = &self.module {
            dirs.extend(module.content_roots.iter().cloned());
            dirs.extend(
                module
                    .descriptor_file
                    .as_deref()
                    .and_then(Path::parent)
                    .map(Path::to_path_buf),
            );
        }
        dirs.extend(self.project_base.clone());
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_order() {
        let context = BuildContext::new(Some(PathBuf::from("/project"))).with_module(
            ModuleContext::new("core")
                .with_content_root("/project/core/src")
                .with_content_root("/project/core/test")
                .with_descriptor_file("/project/core/core.iml"),
        );
        assert_eq!(
            context.search_dirs(Some(Path::new("/rules"))),
            vec![
                PathBuf::from("/rules"),
                PathBuf::from("/project/core/src"),
                PathBuf::from("/project/core/test"),
                PathBuf::from("/project/core"),
                PathBuf::from("/project"),
            ]
        );
    }

    #[test]
    fn empty_context_has_only_document_dir() {
        let context = BuildContext::default();
        assert_eq!(context.search_dirs(Some(Path::new("/rules"))), vec![PathBuf::from("/rules")]);
        assert!(context.search_dirs(None).is_empty());
    }
}
