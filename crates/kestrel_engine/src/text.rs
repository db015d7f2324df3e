//! The text of one staged file, split into lines.

use std::path::{Path, PathBuf};

/// File content as checks see it.
///
/// Lines are split on `\r\n`, `\n`, and `\r`, so line numbers match the
/// host buffer's visual lines whichever separator the file was staged with.
/// A trailing separator does not start an extra line.
#[derive(Clone, Debug)]
pub struct FileText {
    path: PathBuf,
    content: String,
    lines: Vec<String>,
}

impl FileText {
    /// Reads a file, replacing invalid UTF-8 sequences.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Self::new(path, content))
    }

    /// Wraps in-memory content.
    pub fn new(path: impl Into<PathBuf>, content: String) -> Self {
        let lines = split_lines(&content);
        Self {
            path: path.into(),
            content,
            lines,
        }
    }

    /// Returns the path the text was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the raw content, separators included.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the lines without separators.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

fn split_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
