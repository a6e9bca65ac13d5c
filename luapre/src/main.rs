use std::process::{Command, ExitCode};
use std::rc::Rc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use luapre::cli::CliArgs;
use luapre::config::Config;
use luapre::project::{write_outputs, Project};
use luapre::script::DiskFiles;

fn main() -> anyhow::Result<ExitCode> {
    let args = CliArgs::parse();

    // ── Logging: RUST_LOG wins, otherwise -v picks the level ─────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(args.log_level().into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let (mut config, source) = Config::discover(args.config.as_deref())?;
    match &source {
        Some(path) => info!(config = %path.display(), "loaded config"),
        None => info!("no config file, using defaults"),
    }
    args.apply(&mut config);
    config.validate()?;

    // ── Preprocess the entry file and its imports ─────────────────────────────
    let emitted = Project::lua(&config, Rc::new(DiskFiles::new())).process(&args.file)?;

    if args.stdout {
        if emitted.len() > 1 {
            warn!(count = emitted.len() - 1, "--stdout prints only the entry file; imports not written");
        }
        if let Some(entry) = emitted.first() {
            print!("{}", entry.text);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let written = write_outputs(&config.output_dir, &emitted)?;

    // ── Optionally run the result ─────────────────────────────────────────────
    let Some(program) = &args.run else {
        return Ok(ExitCode::SUCCESS);
    };
    let Some(entry) = written.first() else {
        bail!("nothing was emitted for {}", args.file.display());
    };
    info!(program = %program, file = %entry.display(), "running");
    let status = Command::new(program)
        .arg(entry)
        .status()
        .with_context(|| format!("cannot run `{program}`"))?;
    Ok(match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}
