//! Tickscope CLI
//!
//! Runs diagnostics operations against a registry snapshot file, either
//! one request per invocation or interactively from stdin.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tickscope::commands::{display_version, respond, validate_snapshot_file, Command};
use tickscope::config::{load_config, load_config_optional, DiagnosticsConfig};
use tickscope::engine::DiagnosticsEngine;
use tickscope::memory::{SessionBaselines, SessionId};
use tickscope::snapshot::FileRegistry;

const DEFAULT_CONFIG_FILE: &str = "tickscope.toml";

/// Tickscope - runtime diagnostics for tick-based servers
#[derive(Parser, Debug)]
#[command(name = "tickscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options shared by every command that builds an engine
#[derive(clap::Args, Debug)]
struct EngineArgs {
    /// Registry snapshot JSON file
    #[arg(short, long, env = "TICKSCOPE_SNAPSHOT")]
    snapshot: PathBuf,

    /// Configuration file (defaults to ./tickscope.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session that owns baselines
    #[arg(long, default_value = "cli")]
    session: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one diagnostics operation
    Run {
        #[command(flatten)]
        engine: EngineArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Operation name (see `help`)
        op: String,

        /// Operation arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Read operations from stdin, one per line, until `quit`
    Console {
        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Validate a registry snapshot file
    Validate {
        /// Path to snapshot JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Run {
            engine,
            json,
            op,
            args,
        } => {
            let session = SessionId::new(engine.session.clone());
            let engine = build_engine(&engine)?;
            let result = run_once(&engine, &session, &op, &args, json);
            engine.shutdown();
            result?;
        }

        Commands::Console { engine } => {
            let session = SessionId::new(engine.session.clone());
            let engine = build_engine(&engine)?;
            let result = run_console(&engine, &session);
            engine.shutdown();
            result?;
        }

        Commands::Validate { file } => {
            validate_snapshot_file(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Build an engine over the snapshot file and this process
///
/// **Private** - shared by `run` and `console`
fn build_engine(args: &EngineArgs) -> Result<DiagnosticsEngine> {
    let config = read_config(args.config.as_deref())?;

    let registry = Arc::new(FileRegistry::new(&args.snapshot));
    info!("Reading registry from {}", registry.path().display());

    let engine = DiagnosticsEngine::builder(registry)
        .config(config)
        .baseline_store(Arc::new(SessionBaselines::new()))
        .with_default_probes()
        .build()
        .context("Failed to initialise process statistics")?;

    Ok(engine)
}

fn read_config(path: Option<&Path>) -> Result<DiagnosticsConfig> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => load_config_optional(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG_FILE)),
    }
}

/// Execute one operation and print its report
///
/// **Private** - internal command implementation
fn run_once(
    engine: &DiagnosticsEngine,
    session: &SessionId,
    op: &str,
    args: &[String],
    json: bool,
) -> Result<()> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let command = Command::parse(op, &args)?;
    let output = tickscope::execute(engine, session, &command)
        .with_context(|| format!("'{}' failed", op))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize report")?
        );
    } else {
        print!("{}", output.render());
    }
    Ok(())
}

/// Interactive loop; errors of single requests are printed and the loop goes on
///
/// **Private** - internal command implementation
fn run_console(engine: &DiagnosticsEngine, session: &SessionId) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("tickscope console (session {}); 'help' lists operations, 'quit' exits", session);
    loop {
        print!("> ");
        stdout.flush().context("Failed to write prompt")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("Failed to read request")? == 0 {
            break;
        }

        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        if matches!(request, "quit" | "exit") {
            break;
        }
        println!("{}", respond(engine, session, request));
    }
    Ok(())
}
