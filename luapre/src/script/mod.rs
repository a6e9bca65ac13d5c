//! Interpreter binding.
//!
//! Directive bodies are opaque to the engine: script blocks are handed to an
//! [`Interpreter`] to run for their side effects, and guard expressions are
//! handed to it to produce a truth value.  The interpreter owns the document
//! environment, so bindings made by one script are visible to every later
//! script and guard in the same document.
//!
//! The production implementation is [`LuaInterpreter`] (feature `lua`).
//!
//! # Quick start
//!
//! ```rust
//! # #[cfg(feature = "lua")] {
//! use luapre::script::{Interpreter, LuaInterpreter, LuaSetup};
//!
//! let mut lua = LuaInterpreter::new(LuaSetup::default()).unwrap();
//! lua.exec("optimize = true", "doc:1").unwrap();
//! assert!(lua.test("optimize", "doc:2").unwrap());
//! # }
//! ```

pub mod host;
#[cfg(feature = "lua")]
pub mod lua;
#[cfg(test)]
pub(crate) mod mock;
pub mod value;

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub use host::{DiskFiles, FileSource, MemoryFiles};
#[cfg(feature = "lua")]
pub use lua::{LuaInterpreter, LuaSetup};
pub use value::Value;

/// Failure raised while running a script or guard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The file-read capability was asked for a file that does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    /// A guard referenced a variable nobody bound, under
    /// [`UnboundPolicy::Error`].
    #[error("unbound variable `{0}`")]
    Unbound(String),
    /// Any other error raised by the script (syntax, runtime, `error()`).
    #[error("{0}")]
    Failed(String),
}

/// What a guard sees when it reads a variable no script has bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnboundPolicy {
    /// The lookup yields `nil` (falsy), as plain Lua would.  Logged at debug
    /// level.
    #[default]
    Nil,
    /// The guard fails with [`ScriptError::Unbound`].
    Error,
}

/// Which standard libraries scripts may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stdlib {
    /// Every safe library, including `io` and `os`.
    #[default]
    Full,
    /// `string`, `table`, `math` and `utf8` only; `read_file` is then the
    /// only way to reach the filesystem.
    Sandboxed,
}

/// An embedded-language runtime holding one document's environment.
pub trait Interpreter {
    /// Run a script block for its side effects.  `chunk` names the source
    /// location (`file:line`) for error messages.
    fn exec(&mut self, source: &str, chunk: &str) -> Result<(), ScriptError>;

    /// Evaluate a guard expression and coerce it with the language's own
    /// truthiness rules.
    fn test(&mut self, guard: &str, chunk: &str) -> Result<bool, ScriptError>;

    /// Bind `name` in the environment (used for predefined variables).
    fn define(&mut self, name: &str, value: Value) -> Result<(), ScriptError>;

    /// Read a scalar binding; `None` if unbound or not a scalar.
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl<I: Interpreter + ?Sized> Interpreter for &mut I {
    fn exec(&mut self, source: &str, chunk: &str) -> Result<(), ScriptError> {
        (**self).exec(source, chunk)
    }

    fn test(&mut self, guard: &str, chunk: &str) -> Result<bool, ScriptError> {
        (**self).test(guard, chunk)
    }

    fn define(&mut self, name: &str, value: Value) -> Result<(), ScriptError> {
        (**self).define(name, value)
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        (**self).lookup(name)
    }
}
