//! Project-relative path tokens for portable persisted locations.

use std::path::Path;

/// Token standing for the project directory in persisted file locations.
pub const PROJECT_DIR_TOKEN: &str = "$PROJECT_DIR$";

/// Replaces a leading `project_dir` in `location` with [`PROJECT_DIR_TOKEN`].
///
/// Locations outside the project are returned unchanged.
pub fn tokenise_path(location: &str, project_dir: Option<&Path>) -> String {
    let Some(dir) = project_dir.and_then(Path::to_str) else {
        return location.to_string();
    };
    let dir = dir.trim_end_matches(['/', '\\']);
    if dir.is_empty() {
        return location.to_string();
    }
    match location.strip_prefix(dir) {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
            format!("{PROJECT_DIR_TOKEN}{rest}")
        }
        _ => location.to_string(),
    }
}

/// Expands a leading [`PROJECT_DIR_TOKEN`] in `location`.
///
/// Returns `None` when the location carries the token but no project
/// directory is known.
pub fn untokenise_path(location: &str, project_dir: Option<&Path>) -> Option<String> {
    let Some(rest) = location.strip_prefix(PROJECT_DIR_TOKEN) else {
        return Some(location.to_string());
    };
    let dir = project_dir?.to_str()?.trim_end_matches(['/', '\\']);
    Some(format!("{dir}{rest}"))
}
