//! Anchoring relative suppression file references found in configuration trees.

use std::path::{Path, PathBuf};

use kestrel_config::ConfigNode;

/// Module name whose `file` property is anchored.
const SUPPRESSION_MODULE: &str = "SuppressionFilter";

/// Property holding the suppression file path.
const FILE_PROPERTY: &str = "file";

/// Returns the first `dir/relative` for which `exists` holds.
///
/// Directories are probed in order and probing stops at the first match.
pub fn resolve_suppression_path(
    search_dirs: &[PathBuf],
    relative: &str,
    exists: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    search_dirs
        .iter()
        .map(|dir| dir.join(relative))
        .find(|candidate| exists(candidate))
}

/// Rewrites the `file` property of every suppression module whose path does
/// not exist verbatim to the first match under `search_dirs`.
///
/// Paths with no match are left unchanged. Returns the number of rewrites.
pub fn anchor_suppression_paths(
    root: &mut ConfigNode,
    search_dirs: &[PathBuf],
    exists: impl Fn(&Path) -> bool,
) -> usize {
    let mut rewritten = 0;
    root.walk_mut(&mut |node| {
        if node.name() != SUPPRESSION_MODULE {
            return;
        }
        let Some(file) = node.property(FILE_PROPERTY).map(str::to_string) else {
            return;
        };
        if exists(Path::new(&file)) {
            return;
        }
        match resolve_suppression_path(search_dirs, &file, &exists) {
            Some(found) => {
                tracing::debug!(from = %file, to = %found.display(), "anchored suppression path");
                node.set_property(FILE_PROPERTY, found.to_string_lossy().into_owned());
                rewritten += 1;
            }
            None => {
                tracing::debug!(path = %file, "suppression path not found in any search directory");
            }
        }
    });
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn dirs() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/rules"),
            PathBuf::from("/project/core/src"),
            PathBuf::from("/project/core/test"),
            PathBuf::from("/project/core"),
            PathBuf::from("/project"),
        ]
    }

    #[test]
    fn stops_at_first_match() {
        let probed = RefCell::new(Vec::new());
        let exists = |p: &Path| {
            probed.borrow_mut().push(p.to_path_buf());
            p == Path::new("/project/core/test/suppressions.xml")
        };
        let found = resolve_suppression_path(&dirs(), "suppressions.xml", exists);
        assert_eq!(found, Some(PathBuf::from("/project/core/test/suppressions.xml")));
        assert_eq!(
            probed.into_inner(),
            vec![
                PathBuf::from("/rules/suppressions.xml"),
                PathBuf::from("/project/core/src/suppressions.xml"),
                PathBuf::from("/project/core/test/suppressions.xml"),
            ]
        );
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(resolve_suppression_path(&dirs(), "s.xml", |_| false), None);
    }

    #[test]
    fn anchors_only_unresolved_filters() {
        let mut root = ConfigNode::new("Checker")
            .with_child(ConfigNode::new("SuppressionFilter").with_property("file", "suppressions.xml"))
            .with_child(
                ConfigNode::new("TreeWalker").with_child(
                    ConfigNode::new("SuppressionFilter").with_property("file", "/abs/present.xml"),
                ),
            )
            .with_child(ConfigNode::new("SuppressionFilter").with_property("file", "nowhere.xml"))
            .with_child(ConfigNode::new("LineLength").with_property("file", "suppressions.xml"));

        let exists = |p: &Path| {
            p == Path::new("/abs/present.xml") || p == Path::new("/project/core/test/suppressions.xml")
        };
        assert_eq!(anchor_suppression_paths(&mut root, &dirs(), exists), 1);

        let files: Vec<_> = root
            .children()
            .iter()
            .map(|n| n.property("file").unwrap_or_default().to_string())
            .collect();
        assert_eq!(files[0], "/project/core/test/suppressions.xml");
        assert_eq!(files[2], "nowhere.xml");
        assert_eq!(files[3], "suppressions.xml");
        assert_eq!(
            root.find("TreeWalker").unwrap().children()[0].property("file"),
            Some("/abs/present.xml")
        );
    }
}
