//! Ember CLI
//!
//! Main entry point for the `ember` command.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ember::{Hir, NativeTable, RuntimeConfig};

/// Configuration file picked up from the working directory
const DEFAULT_CONFIG: &str = "ember.toml";

#[derive(Parser)]
#[command(name = "ember")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Runtime for the Ember scripting language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Runtime configuration (defaults to ./ember.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program given as a JSON node tree
    Run {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// List the native functions
    Natives,

    /// Show information about the runtime
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Run { input } => run(&input, cli.config.as_deref()),
        Commands::Natives => natives(),
        Commands::Info => info(),
    }
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
        None => return Ok(RuntimeConfig::default()),
    };
    tracing::debug!("Loading configuration from {:?}", path);
    RuntimeConfig::load(path).into_diagnostic()
}

fn run(input: &Path, config: Option<&Path>) -> Result<()> {
    tracing::info!("Running {:?}", input);

    let config = load_config(config)?;
    let source = std::fs::read_to_string(input)
        .map_err(|e| miette::miette!("Failed to read input file: {}", e))?;
    let hir = Hir::from_json(&source)
        .into_diagnostic()
        .wrap_err_with(|| format!("{} is not a valid program", input.display()))?;
    tracing::debug!("Loaded {} functions", hir.functions.len());

    let outcome = ember::run(&hir, config)?;
    if let Some(value) = outcome.value {
        println!("{}", value);
    }
    Ok(())
}

fn natives() -> Result<()> {
    let table = NativeTable::standard();
    for entry in table.entries() {
        let params = entry
            .params
            .iter()
            .map(|ty| ty.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match entry.return_type {
            Some(ret) => println!("  {}({}) -> {}", entry.name, params, ret),
            None => println!("  {}({})", entry.name, params),
        }
    }
    Ok(())
}

fn info() -> Result<()> {
    println!("Ember Runtime");
    println!("=============");
    println!();
    println!("Version: {}", ember::VERSION);
    println!();
    println!("Types:");
    for ty in ember::DataType::all() {
        print!(" {}", ty);
    }
    println!();
    println!();

    let config = RuntimeConfig::default();
    println!("Defaults:");
    println!("  loop counter slots: {}", config.loop_counter_slots);
    println!("  max call depth:     {}", config.max_call_depth);
    Ok(())
}
