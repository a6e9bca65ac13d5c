//! Host capabilities exposed to directive scripts.
//!
//! The engine itself only ever needs "read a named file as text"; everything
//! that touches the filesystem goes through [`FileSource`] so tests can swap
//! in [`MemoryFiles`].  The string helpers back the `split` and `key_value`
//! script functions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::ScriptError;

/// Read-only file access.
pub trait FileSource {
    /// Full text of `path`.  A missing file is [`ScriptError::FileNotFound`].
    fn read_to_string(&self, path: &Path) -> Result<String, ScriptError>;

    fn exists(&self, path: &Path) -> bool;
}

/// The real filesystem, with relative paths resolved against `base`.
#[derive(Debug, Clone, Default)]
pub struct DiskFiles {
    base: Option<PathBuf>,
}

impl DiskFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base` instead of the process cwd.
    pub fn rooted(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl FileSource for DiskFiles {
    fn read_to_string(&self, path: &Path) -> Result<String, ScriptError> {
        let full = self.resolve(path);
        std::fs::read_to_string(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScriptError::FileNotFound(path.to_path_buf()),
            _ => ScriptError::Failed(format!("{}: {e}", full.display())),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }
}

/// In-memory files keyed by path, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: HashMap<PathBuf, String>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    /// Builder-style [`MemoryFiles::insert`].
    pub fn with(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl FileSource for MemoryFiles {
    fn read_to_string(&self, path: &Path) -> Result<String, ScriptError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ScriptError::FileNotFound(path.to_path_buf()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

// ── String helpers ────────────────────────────────────────────────────────────

/// Split `text` around every occurrence of the plain separator `sep`.
///
/// An empty separator splits into characters.
pub fn split(text: &str, sep: &str) -> Vec<String> {
    if sep.is_empty() {
        return text.chars().map(String::from).collect();
    }
    text.split(sep).map(str::to_owned).collect()
}

/// Extract a `name = value` or `name: value` pair from one line.
///
/// The name is a word (letters, digits, `_`, `.`, `-`); the value is the rest
/// of the line with surrounding whitespace and one layer of matching quotes
/// removed.  Comment lines (`#`, `;`, `--`) and lines without a separator
/// yield `None`.
pub fn key_value(line: &str) -> Option<(String, String)> {
    static KV: OnceLock<Regex> = OnceLock::new();
    let re = KV.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z_][\w.\-]*)\s*[=:]\s*(.*?)\s*$").expect("static regex")
    });

    let trimmed = line.trim_start();
    if trimmed.starts_with('#') || trimmed.starts_with(';') || trimmed.starts_with("--") {
        return None;
    }
    let caps = re.captures(line)?;
    let name = caps[1].to_owned();
    let mut value = &caps[2];
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            value = &value[1..value.len() - 1];
            break;
        }
    }
    Some((name, value.to_owned()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
