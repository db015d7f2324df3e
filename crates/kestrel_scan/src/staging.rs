//! Materializing in-memory buffers as temporary files for the engine.

use std::io::Write;
use std::path::{Path, PathBuf};

use kestrel_source::LineSeparator;
use tempfile::NamedTempFile;

use crate::error::StagingError;

/// Default staging file name prefix.
pub const DEFAULT_PREFIX: &str = "kestrel";

/// Writes source buffers to temporary files.
#[derive(Clone, Debug)]
pub struct FileStager {
    dir: Option<PathBuf>,
    prefix: String,
}

impl Default for FileStager {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStager {
    /// Stages into the system temporary directory.
    pub fn new() -> Self {
        Self {
            dir: None,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Stages into `dir` instead of the system temporary directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Sets the file name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the staging directory.
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Stages `content`, writing `separator` for every `\n`.
    pub fn stage(&self, content: &str, separator: LineSeparator) -> Result<StagedFile, StagingError> {
        self.stage_with_suffix(content, separator, "")
    }

    /// Stages `content` into a file whose name ends in `suffix`.
    ///
    /// Pass the source's extension (with its dot) so extension-sensitive
    /// checks see the same name shape as the original file.
    pub fn stage_with_suffix(
        &self,
        content: &str,
        separator: LineSeparator,
        suffix: &str,
    ) -> Result<StagedFile, StagingError> {
        let dir = self.dir();
        let mut file = tempfile::Builder::new()
            .prefix(&self.prefix)
            .suffix(suffix)
            .tempfile_in(&dir)
            .map_err(|source| StagingError::Create { dir, source })?;

        let staged = replace_newlines(content, separator);
        file.write_all(staged.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| StagingError::Write {
                path: file.path().to_path_buf(),
                source,
            })?;
        tracing::trace!(path = %file.path().display(), bytes = staged.len(), "staged file");
        Ok(StagedFile { file })
    }
}

/// Replaces every `\n` in `content` with `separator`.
pub fn replace_newlines(content: &str, separator: LineSeparator) -> String {
    match separator {
        LineSeparator::Lf => content.to_string(),
        other => content.replace('\n', other.as_str()),
    }
}

/// A staged file. Dropping the handle deletes the file.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    /// Returns the staged file's path.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Deletes the file now, reporting any failure.
    pub fn release(self) -> Result<(), StagingError> {
        let path = self.file.path().to_path_buf();
        self.file
            .close()
            .map_err(|source| StagingError::Release { path, source })
    }
}
