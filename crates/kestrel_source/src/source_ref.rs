//! Identity of a host source buffer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies one source buffer handed to a scan.
///
/// A `SourceRef` pairs the id the host assigned to the buffer with the path
/// the buffer is known by. Diagnostics and per-file scan results are keyed by
/// it, never by the transient staged file the engine actually reads.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct SourceRef {
    id: u32,
    path: PathBuf,
}

impl SourceRef {
    /// Creates a reference from a host id and the buffer's path.
    pub fn new(id: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }

    /// Returns the host-assigned id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the path the host knows this buffer by.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file extension, if the path has one.
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let r = SourceRef::new(7, "src/Main.java");
        assert_eq!(r.id(), 7);
        assert_eq!(r.path(), Path::new("src/Main.java"));
        assert_eq!(r.extension(), Some("java"));
    }

    #[test]
    fn same_path_different_id_differs() {
        let a = SourceRef::new(0, "a.java");
        let b = SourceRef::new(1, "a.java");
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn display_is_path() {
        let r = SourceRef::new(0, "pkg/Foo.java");
        assert_eq!(r.to_string(), "pkg/Foo.java");
    }

    #[test]
    fn no_extension() {
        assert_eq!(SourceRef::new(0, "Makefile").extension(), None);
    }

    #[test]
    fn serde_roundtrip() {
        let r = SourceRef::new(3, "x/y.rs");
        let json = serde_json::to_string(&r).unwrap();
        let back: SourceRef = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
