//! Scripted stand-in for a real interpreter, for resolver and engine tests.
//!
//! Scripts are `;`/newline separated `name = literal` assignments, plus
//! `fail <msg>` (raises) and `read <path>` (always file-not-found).  Guards
//! are a name or literal, optionally prefixed with `not`.  Every call is
//! recorded in [`MockInterpreter::calls`].

use std::collections::HashMap;
use std::path::PathBuf;

use super::{Interpreter, ScriptError, Value};

#[derive(Debug, Default)]
pub struct MockInterpreter {
    pub vars: HashMap<String, Value>,
    /// `exec <chunk>` / `test <chunk>` in call order.
    pub calls: Vec<String>,
}

impl MockInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    fn value_of(&self, term: &str) -> Value {
        self.vars
            .get(term)
            .cloned()
            .unwrap_or_else(|| match Value::parse_literal(term) {
                // A bare unknown word is an unbound variable.
                Value::Str(s) if s == term => Value::Nil,
                v => v,
            })
    }
}

impl Interpreter for MockInterpreter {
    fn exec(&mut self, source: &str, chunk: &str) -> Result<(), ScriptError> {
        self.calls.push(format!("exec {chunk}"));
        for stmt in source.split([';', '\n']).map(str::trim).filter(|s| !s.is_empty()) {
            if let Some(msg) = stmt.strip_prefix("fail ") {
                return Err(ScriptError::Failed(msg.to_owned()));
            }
            if let Some(path) = stmt.strip_prefix("read ") {
                return Err(ScriptError::FileNotFound(PathBuf::from(path.trim())));
            }
            let Some((name, value)) = stmt.split_once('=') else {
                return Err(ScriptError::Failed(format!("cannot run `{stmt}`")));
            };
            self.vars
                .insert(name.trim().to_owned(), Value::parse_literal(value));
        }
        Ok(())
    }

    fn test(&mut self, guard: &str, chunk: &str) -> Result<bool, ScriptError> {
        self.calls.push(format!("test {chunk}"));
        let guard = guard.trim();
        Ok(match guard.strip_prefix("not ") {
            Some(rest) => !self.value_of(rest.trim()).is_truthy(),
            None => self.value_of(guard).is_truthy(),
        })
    }

    fn define(&mut self, name: &str, value: Value) -> Result<(), ScriptError> {
        self.vars.insert(name.to_owned(), value);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }
}
