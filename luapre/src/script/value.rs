//! Values exchanged between the engine and the embedded interpreter.
//!
//! Only scalars cross the boundary: predefined variables going in, and
//! variable lookups coming out.  Tables, functions and the like stay inside
//! the interpreter.

use std::fmt;

use serde::Deserialize;

/// A scalar binding in the document environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    #[serde(skip)]
    Nil,
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                // Lua 5.4 prints integral floats with a trailing `.0`.
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl Value {
    /// Lua truthiness: only `nil` and `false` are falsy.  `0` and `""` are
    /// true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Parse a command-line literal (`-D name=value`).
    ///
    /// `true`/`false`/`nil`, integers and floats are recognised; anything
    /// else is a string.  Surrounding quotes force a string.
    pub fn parse_literal(s: &str) -> Self {
        let s = s.trim();
        match s {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            "nil" => return Value::Nil,
            _ => {}
        }
        for q in ['"', '\''] {
            if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
                return Value::Str(s[1..s.len() - 1].to_owned());
            }
        }
        if let Ok(n) = s.parse::<i64>() {
            return Value::Int(n);
        }
        if let Ok(x) = s.parse::<f64>() {
            return Value::Float(x);
        }
        Value::Str(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
