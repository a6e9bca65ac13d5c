//! Engine error surface.
//!
//! Every failure aborts the whole document: there is no partial output and no
//! local recovery.  Errors are created with a byte offset by the stage that
//! detects them and located (line/column, file) by the engine before they
//! reach the caller.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::script::ScriptError;
use crate::source::Document;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// A directive region whose shape cannot be recognised.
    #[error("malformed directive: {0}")]
    MalformedDirective(String),
    /// A close/else directive with no matching open at its level.
    #[error("unbalanced directive: {0}")]
    UnbalancedDirective(String),
    /// An open block never closed before the end of the document.
    #[error("unterminated block: {0}")]
    UnterminatedBlock(String),
    /// A duplicate or orphaned `else`.
    #[error("unexpected else: {0}")]
    UnexpectedElse(String),
    /// The embedded script raised an error.
    #[error("script execution failed: {0}")]
    ScriptExecutionFailure(String),
    /// The file-read capability could not find its target.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    /// Writing emitted output failed.
    #[error("i/o error: {0}")]
    Io(String),
}

/// An [`ErrorKind`] together with where it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub file: Option<PathBuf>,
    /// Byte offset into the document.
    pub offset: usize,
    /// 1-based; `0` until [`Error::locate`] has run.
    pub line: usize,
    pub column: usize,
}

impl Error {
    pub fn new(kind: ErrorKind, offset: usize) -> Self {
        Self {
            kind,
            file: None,
            offset,
            line: 0,
            column: 0,
        }
    }

    /// Map a [`ScriptError`] raised by the directive at `offset`.
    pub fn from_script(err: ScriptError, offset: usize) -> Self {
        let kind = match err {
            ScriptError::FileNotFound(path) => ErrorKind::FileNotFound(path),
            other => ErrorKind::ScriptExecutionFailure(other.to_string()),
        };
        Self::new(kind, offset)
    }

    /// Fill in file and line/column from the document the error came from.
    pub fn locate(mut self, doc: &Document) -> Self {
        let (line, column) = doc.position(self.offset);
        self.line = line;
        self.column = column;
        if self.file.is_none() {
            self.file = doc.path().map(PathBuf::from);
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file.display())?;
        }
        if self.line > 0 {
            write!(f, "{}:{}: ", self.line, self.column)?;
        } else {
            write!(f, "offset {}: ", self.offset)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_file_and_position() {
        let doc = Document::with_path("app.py", "a\nb\"\"\"%end%\"\"\"");
        let err = Error::new(ErrorKind::UnbalancedDirective("`end` at level 1".into()), 3)
            .locate(&doc);
        assert_eq!(
            err.to_string(),
            "app.py:2:2: unbalanced directive: `end` at level 1"
        );
    }

    #[test]
    fn display_unlocated_uses_offset() {
        let err = Error::new(ErrorKind::MalformedDirective("empty".into()), 7);
        assert_eq!(err.to_string(), "offset 7: malformed directive: empty");
    }

    #[test]
    fn script_file_not_found_keeps_its_kind() {
        let err = Error::from_script(ScriptError::FileNotFound("config.yaml".into()), 0);
        assert_eq!(err.kind, ErrorKind::FileNotFound(PathBuf::from("config.yaml")));
    }

    #[test]
    fn other_script_errors_become_execution_failures() {
        let err = Error::from_script(ScriptError::Failed("boom".into()), 0);
        assert!(matches!(err.kind, ErrorKind::ScriptExecutionFailure(m) if m == "boom"));
    }
}
