//! Pipeline entry point: scan → build → resolve → assemble.
//!
//! An [`Engine`] wraps one interpreter, i.e. one environment, and is consumed
//! by [`Engine::process`]: every document starts from a fresh environment.
//! Independent engines share nothing and may run on different threads.

use tracing::debug;

use crate::assemble::assemble;
use crate::error::Error;
use crate::resolve::resolve;
use crate::scan::{scan, Syntax};
use crate::script::Interpreter;
use crate::source::Document;
use crate::tree::build;

pub struct Engine<I> {
    interp: I,
    syntax: Syntax,
}

impl<I: Interpreter> Engine<I> {
    pub fn new(interp: I) -> Self {
        Self::with_syntax(interp, Syntax::default())
    }

    pub fn with_syntax(interp: I, syntax: Syntax) -> Self {
        Self { interp, syntax }
    }

    /// Preprocess `doc`, returning the directive-free text.
    ///
    /// Any error aborts the whole document; nothing is returned for it.
    pub fn process(mut self, doc: &Document) -> Result<String, Error> {
        self.run(doc).map_err(|e| e.locate(doc))
    }

    fn run(&mut self, doc: &Document) -> Result<String, Error> {
        let tokens = scan(doc.text(), &self.syntax)?;
        debug!(document = %doc.name(), tokens = tokens.len(), "scanned");
        let mut blocks = build(tokens)?;
        resolve(&mut blocks, &mut self.interp, doc)?;
        Ok(assemble(&blocks))
    }
}

/// Preprocess a string with a default Lua environment.
#[cfg(feature = "lua")]
pub fn preprocess(text: &str) -> Result<String, Error> {
    use crate::error::ErrorKind;
    use crate::script::{LuaInterpreter, LuaSetup};

    let interp = LuaInterpreter::new(LuaSetup::default())
        .map_err(|e| Error::new(ErrorKind::ScriptExecutionFailure(e.to_string()), 0))?;
    Engine::new(interp).process(&Document::from_text(text))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
