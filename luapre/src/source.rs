//! Source documents and byte-offset → line/column mapping.
//!
//! A [`Document`] is loaded once and never mutated; every later stage borrows
//! slices out of it, so tokens and blocks carry `&str` spans rather than
//! copies.

use std::path::{Path, PathBuf};

use crate::script::{FileSource, ScriptError};

/// One source file (or in-memory string) to preprocess.
#[derive(Debug, Clone)]
pub struct Document {
    path: Option<PathBuf>,
    text: String,
    line_starts: Vec<usize>,
}

impl Document {
    /// Wrap an in-memory string.  The document has no path; chunk names and
    /// error messages use `<input>`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::build(None, text.into())
    }

    /// Wrap already-read text that came from `path`.
    pub fn with_path(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self::build(Some(path.into()), text.into())
    }

    /// Read `path` through a [`FileSource`].
    pub fn load(path: &Path, files: &dyn FileSource) -> Result<Self, ScriptError> {
        let text = files.read_to_string(path)?;
        Ok(Self::with_path(path, text))
    }

    fn build(path: Option<PathBuf>, text: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            path,
            text,
            line_starts,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Display name used in chunk names and diagnostics.
    pub fn name(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => "<input>".to_owned(),
        }
    }

    /// Map a byte offset to a 1-based `(line, column)` pair.
    ///
    /// Columns count characters, not bytes.  Offsets past the end clamp to
    /// the last position.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.line_starts[line];
        let column = self
            .text
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start);
        (line + 1, column + 1)
    }

    /// `name:line` label for the directive starting at `offset`.
    pub fn chunk_name(&self, offset: usize) -> String {
        let (line, _) = self.position(offset);
        format!("{}:{line}", self.name())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
