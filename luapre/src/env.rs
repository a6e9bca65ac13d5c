//! Predefined variables.
//!
//! Bindings from `-D name=value` and the config file's `[define]` table.
//! They are seeded into every document's fresh environment before its first
//! directive runs; scripts may overwrite them like any other variable.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::script::{Interpreter, ScriptError, Value};

/// Name → value bindings applied to each new environment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Defines {
    vars: BTreeMap<String, Value>,
}

impl Defines {
    /// Set (or overwrite) a binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bind everything into `interp`.
    pub fn seed<I: Interpreter + ?Sized>(&self, interp: &mut I) -> Result<(), ScriptError> {
        for (name, value) in &self.vars {
            debug!(%name, %value, "define");
            interp.define(name, value.clone())?;
        }
        Ok(())
    }
}

/// Parse a `name=value` assignment as given to `-D`.
///
/// A bare `name` means `name=true`.  The name must be a Lua identifier.
pub fn parse_define(s: &str) -> Result<(String, Value), String> {
    let (name, value) = match s.split_once('=') {
        Some((n, v)) => (n.trim(), Value::parse_literal(v)),
        None => (s.trim(), Value::Bool(true)),
    };
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(format!("invalid variable name in define: {s:?}"));
    }
    Ok((name.to_owned(), value))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
