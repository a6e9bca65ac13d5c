//! Multi-file driver.
//!
//! Preprocesses an entry file, then every local host-language module it
//! imports (transitively), each in its own fresh environment.  Output is only
//! written once every document succeeded, so a failure anywhere leaves the
//! output tree untouched.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Error, ErrorKind};
use crate::script::{FileSource, Interpreter, ScriptError};
use crate::source::Document;

/// One preprocessed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    /// Where the source was read from.
    pub source: PathBuf,
    /// Path relative to the project root; also the path under the output dir.
    pub relative: PathBuf,
    pub text: String,
}

/// Drives preprocessing of an entry file and its imports.
///
/// `make_interp` is called once per document to create its environment.
pub struct Project<'c, F> {
    config: &'c Config,
    files: Rc<dyn FileSource>,
    make_interp: F,
}

impl<'c, F, I> Project<'c, F>
where
    F: FnMut() -> Result<I, ScriptError>,
    I: Interpreter,
{
    pub fn new(config: &'c Config, files: Rc<dyn FileSource>, make_interp: F) -> Self {
        Self {
            config,
            files,
            make_interp,
        }
    }

    /// Preprocess `entry` and, if enabled, everything it imports.  The entry
    /// document is always first in the result.
    pub fn process(&mut self, entry: &Path) -> Result<Vec<Emitted>, Error> {
        let root = entry.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut queue = VecDeque::from([entry.to_path_buf()]);
        let mut seen: HashSet<PathBuf> = HashSet::from([entry.to_path_buf()]);
        let mut emitted = Vec::new();

        while let Some(path) = queue.pop_front() {
            let text = self.process_one(&path)?;

            if self.config.follow_imports {
                for module in imported_modules(&text) {
                    let candidate = module_path(&root, &module, &self.config.import_extension);
                    if seen.contains(&candidate) {
                        continue;
                    }
                    if self.files.exists(&candidate) {
                        debug!(module = %module, path = %candidate.display(), "following import");
                        seen.insert(candidate.clone());
                        queue.push_back(candidate);
                    } else {
                        debug!(module = %module, "import is not a local module, skipping");
                    }
                }
            }

            let relative = path.strip_prefix(&root).unwrap_or(&path).to_path_buf();
            emitted.push(Emitted {
                source: path,
                relative,
                text,
            });
        }
        Ok(emitted)
    }

    fn process_one(&mut self, path: &Path) -> Result<String, Error> {
        let doc = Document::load(path, self.files.as_ref()).map_err(|e| {
            let mut err = Error::from_script(e, 0);
            err.file = Some(path.to_path_buf());
            err
        })?;

        let mut interp = (self.make_interp)().map_err(|e| Error::from_script(e, 0).locate(&doc))?;
        self.config
            .define
            .seed(&mut interp)
            .map_err(|e| Error::from_script(e, 0).locate(&doc))?;

        let text = Engine::with_syntax(interp, self.config.syntax()).process(&doc)?;
        info!(file = %path.display(), bytes = text.len(), "preprocessed");
        Ok(text)
    }
}

#[cfg(feature = "lua")]
impl<'c> Project<'c, Box<dyn FnMut() -> Result<crate::script::LuaInterpreter, ScriptError>>> {
    /// A project whose documents each get a fresh [`LuaInterpreter`]
    /// configured from `config`.
    ///
    /// [`LuaInterpreter`]: crate::script::LuaInterpreter
    pub fn lua(config: &'c Config, files: Rc<dyn FileSource>) -> Self {
        use crate::script::{LuaInterpreter, LuaSetup};

        let setup = LuaSetup {
            stdlib: config.stdlib,
            unbound: config.unbound,
            files: Rc::clone(&files),
        };
        let make: Box<dyn FnMut() -> Result<LuaInterpreter, ScriptError>> =
            Box::new(move || LuaInterpreter::new(setup.clone()));
        Self::new(config, files, make)
    }
}

/// Write each emitted file to `out_dir/<relative>`, creating directories.
/// Returns the written paths.
pub fn write_outputs(out_dir: &Path, emitted: &[Emitted]) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::with_capacity(emitted.len());
    for e in emitted {
        let dest = out_dir.join(&e.relative);
        let io_err = |err: std::io::Error| {
            let mut error = Error::new(ErrorKind::Io(format!("{}: {err}", dest.display())), 0);
            error.file = Some(e.source.clone());
            error
        };
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&dest, &e.text).map_err(io_err)?;
        info!(path = %dest.display(), "wrote");
        written.push(dest);
    }
    Ok(written)
}

// ── Import scanning ───────────────────────────────────────────────────────────

/// Module names imported by host-language text.
///
/// Recognises `import a.b, c as d` (→ `a.b`, `c`) and
/// `from a.b import x, y` (→ `a.b`, `a.b.x`, `a.b.y`; the latter two cover
/// submodules of a package).  Leading dots of relative imports are dropped.
pub fn imported_modules(text: &str) -> Vec<String> {
    let mut modules = Vec::new();
    for line in text.lines() {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first().copied() {
            Some("import") => {
                let rest = line.trim_start()["import".len()..].trim();
                modules.extend(import_list(rest));
            }
            Some("from") if words.len() >= 4 && words[2] == "import" => {
                let base = words[1].trim_start_matches('.');
                if base.is_empty() {
                    continue;
                }
                modules.push(base.to_owned());
                let (_, names) = line
                    .split_once(" import ")
                    .unwrap_or(("", ""));
                modules.extend(
                    import_list(names)
                        .into_iter()
                        .filter(|n| n != "*")
                        .map(|n| format!("{base}.{n}")),
                );
            }
            _ => {}
        }
    }
    modules
}

/// `a, b as c, (d)` → `["a", "b", "d"]`.
fn import_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|part| part.trim().trim_matches(|c| c == '(' || c == ')').trim())
        .filter_map(|part| part.split_whitespace().next())
        .map(|name| name.trim_start_matches('.').to_owned())
        .filter(|name| !name.is_empty())
        .collect()
}

/// `a.b` → `<root>/a/b.<ext>`.
pub fn module_path(root: &Path, module: &str, ext: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(module.split('.'));
    path.set_extension(ext);
    path
}

// ── Tests ─────────────────────────────────────────────────────────────────────
