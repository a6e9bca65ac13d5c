//! `luapre.toml` configuration.
//!
//! ```toml
//! fence = '"""'
//! sigil = "%"
//! output_dir = "output"
//! follow_imports = true
//! import_extension = "py"
//! unbound = "nil"        # or "error"
//! stdlib = "full"        # or "sandboxed"
//!
//! [define]
//! optimize = true
//! ```
//!
//! Every key is optional.  Command-line flags are applied on top by the
//! binary.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::env::Defines;
use crate::scan::Syntax;
use crate::script::{Stdlib, UnboundPolicy};

/// Name of the per-project config file searched for in the working directory
/// and the user config directory.
pub const CONFIG_FILE_NAME: &str = "luapre.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Preprocessor settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub fence: String,
    pub sigil: char,
    pub output_dir: PathBuf,
    pub follow_imports: bool,
    /// Extension of host-language modules found by import following.
    pub import_extension: String,
    pub unbound: UnboundPolicy,
    pub stdlib: Stdlib,
    pub define: Defines,
}

impl Default for Config {
    fn default() -> Self {
        let syntax = Syntax::default();
        Self {
            fence: syntax.fence,
            sigil: syntax.sigil,
            output_dir: PathBuf::from("output"),
            follow_imports: true,
            import_extension: "py".to_owned(),
            unbound: UnboundPolicy::default(),
            stdlib: Stdlib::default(),
            define: Defines::default(),
        }
    }
}

impl Config {
    /// Parse TOML text.
    pub fn load_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Read and parse a config file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::load_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config the binary should use.
    ///
    /// Priority: `explicit` path → `./luapre.toml` → user config dir →
    /// built-in defaults.  Returns the config and the file it came from.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load_file(path)?, Some(path.to_path_buf())));
        }
        match find_config_file() {
            Some(path) => Ok((Self::load_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fence.is_empty() {
            return Err(ConfigError::Invalid("`fence` must not be empty".into()));
        }
        if self.fence.contains(self.sigil) {
            return Err(ConfigError::Invalid(format!(
                "`fence` {:?} must not contain the sigil {:?}",
                self.fence, self.sigil
            )));
        }
        if self.import_extension.is_empty() {
            return Err(ConfigError::Invalid("`import_extension` must not be empty".into()));
        }
        Ok(())
    }

    pub fn syntax(&self) -> Syntax {
        Syntax {
            fence: self.fence.clone(),
            sigil: self.sigil,
        }
    }
}

/// Search the standard locations for a config file.
/// Returns the first path that exists, or `None`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    let user = directories::ProjectDirs::from("", "", "luapre")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME));
    std::iter::once(local)
        .chain(user)
        .find(|p| p.is_file())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
