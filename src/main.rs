//=============================================
// src/main.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: snx CLI entrypoint for running .snx scripts
// Objective: Load configuration, wire stdio into the engine, run the script
//            and optionally print an expression result as JSON
// Formatting: Zobie.format (.solvraformat)
//=============================================

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use snxscript::value::value_to_json;
use snxscript::{BlockStyle, Engine, EngineIo, EngineOptions, InterpreterConfig, SourceLines};

//=============================================
//            Section 1: CLI Definition
//=============================================

#[derive(Debug, ClapParser)]
#[command(
    name = "snx",
    about = "Runs line-oriented snx scripts.",
    version
)]
struct Args {
    /// Path to the script to execute.
    script: PathBuf,

    /// Block style at program start (`end` or `brackets`).
    #[arg(long)]
    style: Option<BlockStyle>,

    /// Configuration file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log `exec` commands instead of running them.
    #[arg(long)]
    dry_run: bool,

    /// Enable trace-level logging for the interpreter.
    #[arg(long)]
    trace: bool,

    /// Evaluate an expression after the script finishes and print the JSON result.
    #[arg(long)]
    json: Option<String>,

    /// Print a notice when an END statement stops the program.
    #[arg(long)]
    announce_end: bool,
}

//=============================================
//            Section 2: Entry Point
//=============================================

fn main() -> Result<()> {
    let args = Args::parse();
    let config = InterpreterConfig::load(args.config.as_deref())
        .context("Failed to load interpreter configuration")?;
    install_tracing(&config, args.trace);

    if !run_script(&args, &config)? {
        process::exit(1);
    }
    Ok(())
}

fn install_tracing(config: &InterpreterConfig, trace: bool) {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    if trace {
        if let Ok(directive) = "snxscript=trace".parse() {
            filter = filter.add_directive(directive);
        }
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Returns `false` when the run stopped on a fatal error.
fn run_script(args: &Args, config: &InterpreterConfig) -> Result<bool> {
    let source = SourceLines::from_path(&args.script)
        .with_context(|| format!("Failed to read {}", args.script.display()))?;

    let mut options = EngineOptions::from(config);
    if let Some(style) = args.style {
        options.style = style;
    }
    options.announce_end |= args.announce_end;
    let io = EngineIo::standard(config.allow_exec && !args.dry_run);
    let mut engine = Engine::with_io(source, options, io);

    match engine.run() {
        Ok(reason) => tracing::info!(?reason, "program finished"),
        Err(fatal) => {
            eprintln!("{}: fatal [{}]: {fatal}", args.script.display(), fatal.code_str());
            return Ok(false);
        }
    }

    if let Some(expr) = args.json.as_deref() {
        let value = engine.evaluate_expression(expr);
        println!("{}", value_to_json(&value));
    }

    Ok(true)
}
