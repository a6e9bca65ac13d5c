//! Lua 5.4 interpreter via the `mlua` crate.
//!
//! Enabled with the `lua` Cargo feature (on by default).  One
//! [`LuaInterpreter`] is one document environment: its globals table is the
//! variable store every script and guard in the document shares.
//!
//! # Lua API
//!
//! Besides the standard library selected by [`Stdlib`], these globals are
//! registered in every state:
//!
//! | Lua function          | Effect                                           |
//! |-----------------------|--------------------------------------------------|
//! | `read_file(path)`     | Full text of `path`; raises *file not found*     |
//! | `file_exists(path)`   | `true` if `path` is a readable file              |
//! | `split(text, sep)`    | Sequence of pieces around the plain separator    |
//! | `key_value(line)`     | `name, value` from `name = value`, else `nil`    |
//! | `print(...)`          | Writes to stderr so emitted text stays clean     |

use std::path::Path;
use std::rc::Rc;

use mlua::prelude::*;
use tracing::debug;

use super::host::{self, DiskFiles, FileSource};
use super::{Interpreter, ScriptError, Stdlib, UnboundPolicy, Value};

/// Construction options for [`LuaInterpreter`].
#[derive(Clone)]
pub struct LuaSetup {
    pub stdlib: Stdlib,
    pub unbound: UnboundPolicy,
    pub files: Rc<dyn FileSource>,
}

impl Default for LuaSetup {
    fn default() -> Self {
        Self {
            stdlib: Stdlib::default(),
            unbound: UnboundPolicy::default(),
            files: Rc::new(DiskFiles::new()),
        }
    }
}

impl std::fmt::Debug for LuaSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LuaSetup")
            .field("stdlib", &self.stdlib)
            .field("unbound", &self.unbound)
            .finish_non_exhaustive()
    }
}

/// A Lua state holding one document's environment.
pub struct LuaInterpreter {
    lua: Lua,
    /// Installed on `_G` only while a guard runs; its `__index` applies the
    /// [`UnboundPolicy`].
    guard_meta: LuaTable,
}

impl LuaInterpreter {
    pub fn new(setup: LuaSetup) -> Result<Self, ScriptError> {
        Self::build(setup).map_err(script_error)
    }

    fn build(setup: LuaSetup) -> LuaResult<Self> {
        let lua = match setup.stdlib {
            Stdlib::Full => Lua::new(),
            Stdlib::Sandboxed => Lua::new_with(
                LuaStdLib::STRING | LuaStdLib::TABLE | LuaStdLib::MATH | LuaStdLib::UTF8,
                LuaOptions::default(),
            )?,
        };

        Self::register_api(&lua, setup.files)?;
        let guard_meta = Self::guard_metatable(&lua, setup.unbound)?;

        Ok(Self { lua, guard_meta })
    }

    // ── Host API registration ─────────────────────────────────────────────

    fn register_api(lua: &Lua, files: Rc<dyn FileSource>) -> LuaResult<()> {
        let globals = lua.globals();

        // read_file(path) → string
        {
            let files = Rc::clone(&files);
            globals.set(
                "read_file",
                lua.create_function(move |_, path: String| {
                    files
                        .read_to_string(Path::new(&path))
                        .map_err(LuaError::external)
                })?,
            )?;
        }

        // file_exists(path) → bool
        {
            let files = Rc::clone(&files);
            globals.set(
                "file_exists",
                lua.create_function(move |_, path: String| Ok(files.exists(Path::new(&path))))?,
            )?;
        }

        // split(text, sep) → { pieces }
        globals.set(
            "split",
            lua.create_function(|_, (text, sep): (String, String)| Ok(host::split(&text, &sep)))?,
        )?;

        // key_value(line) → name, value | nil
        globals.set(
            "key_value",
            lua.create_function(|_, line: String| {
                Ok(match host::key_value(&line) {
                    Some((name, value)) => (Some(name), Some(value)),
                    None => (None, None),
                })
            })?,
        )?;

        // print(...) → stderr
        globals.set(
            "print",
            lua.create_function(|lua, args: LuaMultiValue| {
                let tostring: LuaFunction = lua.globals().get("tostring")?;
                let parts = args
                    .into_iter()
                    .map(|v| tostring.call::<String>(v))
                    .collect::<LuaResult<Vec<_>>>()?;
                eprintln!("{}", parts.join("\t"));
                Ok(())
            })?,
        )?;

        Ok(())
    }

    fn guard_metatable(lua: &Lua, policy: UnboundPolicy) -> LuaResult<LuaTable> {
        let meta = lua.create_table()?;
        meta.set(
            "__index",
            lua.create_function(move |_, (_, key): (LuaValue, LuaValue)| {
                let name = match &key {
                    LuaValue::String(s) => s.to_string_lossy().to_string(),
                    other => format!("{other:?}"),
                };
                match policy {
                    UnboundPolicy::Nil => {
                        debug!(variable = %name, "guard reads unbound variable as nil");
                        Ok(LuaValue::Nil)
                    }
                    UnboundPolicy::Error => Err(LuaError::external(ScriptError::Unbound(name))),
                }
            })?,
        )?;
        Ok(meta)
    }

}

impl Interpreter for LuaInterpreter {
    fn exec(&mut self, source: &str, chunk: &str) -> Result<(), ScriptError> {
        self.lua
            .load(source)
            .set_name(chunk)
            .exec()
            .map_err(script_error)
    }

    fn test(&mut self, guard: &str, chunk: &str) -> Result<bool, ScriptError> {
        let globals = self.lua.globals();
        // A metatable a script put on `_G` owns unbound lookups; the policy
        // only applies to a plain environment.
        let own_meta = globals.metatable().is_none();
        if own_meta {
            globals.set_metatable(Some(self.guard_meta.clone()));
        }
        let result = self
            .lua
            .load(format!("return {guard}"))
            .set_name(chunk)
            .eval::<LuaValue>();
        if own_meta {
            globals.set_metatable(None);
        }

        let value = result.map_err(script_error)?;
        Ok(!matches!(value, LuaValue::Nil | LuaValue::Boolean(false)))
    }

    fn define(&mut self, name: &str, value: Value) -> Result<(), ScriptError> {
        let lua_value = match value {
            Value::Nil => LuaValue::Nil,
            Value::Bool(b) => LuaValue::Boolean(b),
            Value::Int(n) => LuaValue::Integer(n),
            Value::Float(x) => LuaValue::Number(x),
            Value::Str(s) => LuaValue::String(self.lua.create_string(&s).map_err(script_error)?),
        };
        self.lua
            .globals()
            .set(name, lua_value)
            .map_err(script_error)
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        let value: LuaValue = self.lua.globals().raw_get(name).ok()?;
        match value {
            LuaValue::Boolean(b) => Some(Value::Bool(b)),
            LuaValue::Integer(n) => Some(Value::Int(n)),
            LuaValue::Number(x) => Some(Value::Float(x)),
            LuaValue::String(s) => Some(Value::Str(s.to_string_lossy().to_string())),
            _ => None,
        }
    }
}

/// Recover a [`ScriptError`] raised by one of our callbacks, or wrap the Lua
/// error's message.
fn script_error(err: LuaError) -> ScriptError {
    match find_script_error(&err) {
        Some(e) => e.clone(),
        None => ScriptError::Failed(err.to_string()),
    }
}

fn find_script_error(err: &LuaError) -> Option<&ScriptError> {
    match err {
        LuaError::ExternalError(inner) => inner.downcast_ref::<ScriptError>(),
        LuaError::CallbackError { cause, .. } | LuaError::WithContext { cause, .. } => {
            find_script_error(cause)
        }
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
