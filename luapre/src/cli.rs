//! Command-line argument parsing.
//!
//! Usage:
//!   luapre [-c CONFIG] [-o DIR] [-D NAME[=VALUE]]... [--strict] [--sandbox]
//!          [--no-imports] [--stdout] [--run PROGRAM] [-v...] <FILE>

use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::config::Config;
use crate::env::parse_define;
use crate::script::{Stdlib, UnboundPolicy};

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "luapre",
    version,
    about = "Preprocess source files with embedded Lua directives."
)]
pub struct CliArgs {
    /// Config file (default: ./luapre.toml, then the user config directory).
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory emitted files are written under.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Predefine a variable; a bare NAME is `true`.  Repeatable.
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]", value_parser = parse_define)]
    pub define: Vec<(String, crate::script::Value)>,

    /// Fail when a guard reads an unbound variable.
    #[arg(long)]
    pub strict: bool,

    /// Restrict scripts to the string/table/math/utf8 libraries.
    #[arg(long)]
    pub sandbox: bool,

    /// Do not preprocess imported local modules.
    #[arg(long)]
    pub no_imports: bool,

    /// Print emitted text to stdout instead of writing files.
    #[arg(long)]
    pub stdout: bool,

    /// Run PROGRAM on the emitted entry file afterwards.
    #[arg(long, value_name = "PROGRAM", conflicts_with = "stdout")]
    pub run: Option<String>,

    /// More logging (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Entry source file.
    #[arg(required = true)]
    pub file: PathBuf,
}

// ── Applying ──────────────────────────────────────────────────────────────────

impl CliArgs {
    /// Apply flags on top of a loaded config.  Defines from the command line
    /// win over `[define]` entries.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        for (name, value) in &self.define {
            config.define.set(name.clone(), value.clone());
        }
        if self.strict {
            config.unbound = UnboundPolicy::Error;
        }
        if self.sandbox {
            config.stdlib = Stdlib::Sandboxed;
        }
        if self.no_imports {
            config.follow_imports = false;
        }
    }

    /// Log level selected by `-v`, used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Value;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("luapre").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn file_only() {
        let a = parse(&["python.py"]);
        assert_eq!(a.file, PathBuf::from("python.py"));
        assert!(a.config.is_none());
        assert!(a.define.is_empty());
        assert!(!a.strict && !a.sandbox && !a.no_imports && !a.stdout);
        assert_eq!(a.log_level(), LevelFilter::WARN);
    }

    #[test]
    fn file_is_required() {
        assert!(CliArgs::try_parse_from(["luapre"]).is_err());
    }

    #[test]
    fn defines_are_parsed() {
        let a = parse(&["-D", "optimize", "--define", "level=3", "-Dname=\"x\"", "f.py"]);
        assert_eq!(
            a.define,
            vec![
                ("optimize".to_owned(), Value::Bool(true)),
                ("level".to_owned(), Value::Int(3)),
                ("name".to_owned(), Value::Str("x".into())),
            ]
        );
    }

    #[test]
    fn bad_define_is_rejected() {
        assert!(CliArgs::try_parse_from(["luapre", "-D", "1abc=2", "f.py"]).is_err());
    }

    #[test]
    fn run_conflicts_with_stdout() {
        assert!(CliArgs::try_parse_from(["luapre", "--stdout", "--run", "python3", "f.py"]).is_err());
        assert_eq!(parse(&["--run", "python3", "f.py"]).run.as_deref(), Some("python3"));
    }

    #[test]
    fn verbosity() {
        assert_eq!(parse(&["-v", "f.py"]).log_level(), LevelFilter::INFO);
        assert_eq!(parse(&["-vv", "f.py"]).log_level(), LevelFilter::DEBUG);
        assert_eq!(parse(&["-vvvv", "f.py"]).log_level(), LevelFilter::TRACE);
    }

    #[test]
    fn apply_overrides_config() {
        let mut config = Config::default();
        config.define.set("optimize", false);
        config.define.set("keep", 1i64);
        let a = parse(&[
            "-o", "dist", "-D", "optimize", "--strict", "--sandbox", "--no-imports", "f.py",
        ]);
        a.apply(&mut config);
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(config.define.get("optimize"), Some(&Value::Bool(true)));
        assert_eq!(config.define.get("keep"), Some(&Value::Int(1)));
        assert_eq!(config.unbound, UnboundPolicy::Error);
        assert_eq!(config.stdlib, Stdlib::Sandboxed);
        assert!(!config.follow_imports);
    }

    #[test]
    fn apply_without_flags_keeps_config() {
        let mut config = Config::default();
        config.unbound = UnboundPolicy::Error;
        parse(&["f.py"]).apply(&mut config);
        assert_eq!(config.unbound, UnboundPolicy::Error);
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }
}
