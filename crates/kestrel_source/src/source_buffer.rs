//! In-memory source text with a line-start index.

use crate::source_ref::SourceRef;
use kestrel_common::ContentHash;

/// A source buffer as the host holds it.
///
/// The content uses `\n` as its only line marker. Line starts are
/// precomputed so diagnostics can be mapped back to visual lines.
#[derive(Debug)]
pub struct SourceBuffer {
    source: SourceRef,
    /// The full text content, `\n`-separated.
    pub content: String,
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
    /// Hash of the content at the time the buffer was captured.
    pub content_hash: ContentHash,
}

impl SourceBuffer {
    /// Creates a buffer, normalizing any `\r\n` or lone `\r` to `\n`.
    pub fn new(source: SourceRef, content: String) -> Self {
        let content = normalize_newlines(content);
        let line_starts = compute_line_starts(&content);
        let content_hash = ContentHash::from_bytes(content.as_bytes());
        Self {
            source,
            content,
            line_starts,
            content_hash,
        }
    }

    /// Returns the identity of this buffer.
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// Returns the number of visual lines (an empty buffer has one).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the text of a 1-indexed line without its newline.
    pub fn line(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(self.content.len(), |next| *next as usize - 1);
        Some(&self.content[start..end])
    }

    /// Converts a byte offset into 1-indexed (line, column) coordinates.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line = (line_idx as u32) + 1;
        let col = byte_offset - self.line_starts[line_idx] + 1;
        (line, col)
    }
}

/// Rewrites `\r\n` and lone `\r` to `\n`.
fn normalize_newlines(content: String) -> String {
    if !content.contains('\r') {
        return content;
    }
    content.replace("\r\n", "\n").replace('\r', "\n")
}

fn compute_line_starts(content: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(content: &str) -> SourceBuffer {
        SourceBuffer::new(SourceRef::new(0, "Test.java"), content.to_string())
    }

    #[test]
    fn line_starts_computation() {
        let b = make("abc\ndef\nghi");
        assert_eq!(b.line_starts, vec![0, 4, 8]);
        assert_eq!(b.line_count(), 3);
    }

    #[test]
    fn line_col_resolution() {
        let b = make("abc\ndef\nghi");
        assert_eq!(b.line_col(0), (1, 1));
        assert_eq!(b.line_col(4), (2, 1));
        assert_eq!(b.line_col(5), (2, 2));
        assert_eq!(b.line_col(8), (3, 1));
    }

    #[test]
    fn line_text() {
        let b = make("abc\ndef\n");
        assert_eq!(b.line(1), Some("abc"));
        assert_eq!(b.line(2), Some("def"));
        assert_eq!(b.line(3), Some(""));
        assert_eq!(b.line(4), None);
        assert_eq!(b.line(0), None);
    }

    #[test]
    fn crlf_is_normalized() {
        let b = make("a\r\nb\rc");
        assert_eq!(b.content, "a\nb\nc");
        assert_eq!(b.line_count(), 3);
    }

    #[test]
    fn empty_buffer() {
        let b = make("");
        assert_eq!(b.line_starts, vec![0]);
        assert_eq!(b.line_col(0), (1, 1));
    }

    #[test]
    fn content_hash_of_normalized_text() {
        let b = make("x\r\ny");
        assert_eq!(b.content_hash, ContentHash::from_bytes(b"x\ny"));
    }
}
