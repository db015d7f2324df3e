//! Content fingerprints for configuration documents and fetched resources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

/// A 128-bit XXH3 fingerprint of a byte sequence.
///
/// Two documents with the same `ContentHash` are assumed to be identical.
/// The engine cache records the hash of the configuration document each
/// engine was built from, and the HTTP resolver names its cache files after
/// the hash of the URL they were fetched from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes the hash of a byte slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Reads a file and computes the hash of its full contents.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(&data))
    }

    /// Returns the first eight hex digits, enough to tell entries apart in logs.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}..)", self.short())
    }
}
