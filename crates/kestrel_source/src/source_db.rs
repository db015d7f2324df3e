//! The host's store of source buffers.

use crate::source_buffer::SourceBuffer;
use crate::source_ref::SourceRef;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Owns the source buffers a host hands to scans.
///
/// Buffers are shared with scan workers through `Arc`, so a scan keeps
/// reading the text it was started with even if the host later replaces it.
pub struct SourceDb {
    buffers: Vec<Arc<SourceBuffer>>,
}

impl SourceDb {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            buffers: Vec::new(),
        }
    }

    /// Reads a file from disk into a new buffer.
    pub fn load_file(&mut self, path: &Path) -> Result<SourceRef, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.add_source(path, content))
    }

    /// Adds an in-memory buffer known by `name`.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: String) -> SourceRef {
        let source = SourceRef::new(self.buffers.len() as u32, name);
        self.buffers
            .push(Arc::new(SourceBuffer::new(source.clone(), content)));
        source
    }

    /// Returns the buffer for a reference created by this store.
    pub fn get(&self, source: &SourceRef) -> Option<&Arc<SourceBuffer>> {
        self.buffers
            .get(source.id() as usize)
            .filter(|b| b.source() == source)
    }

    /// Returns every buffer in insertion order.
    pub fn buffers(&self) -> &[Arc<SourceBuffer>] {
        &self.buffers
    }

    /// Returns the number of buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns `true` if the store holds no buffers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl Default for SourceDb {
    fn default() -> Self {
        Self::new()
    }
}
