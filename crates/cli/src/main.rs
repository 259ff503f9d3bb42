//! CLI entry point for podarchive
//!
//! Parses command line arguments, sets up logging and runs one subcommand
//! against a podcast archive.

mod commands;

use clap::{Args, Parser, Subcommand};
use podarchive_config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// podarchive - validate, build and tag a podcast archive
#[derive(Parser, Debug)]
#[command(name = "podarchive")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: podarchive.toml, if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip the external tool checks before build and tag
    #[arg(long, global = true)]
    pub skip_checks: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// The archive a subcommand works on.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Base directory of the podcast (containing meta/, media/ and build/)
    pub podcast_dir: PathBuf,

    /// Only process this node and its children: an episode number, an
    /// episode directory name or id, or `<episode>:_<part>`
    #[arg(long, value_name = "SPECIFIER")]
    pub only: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the archive for structural and metadata problems
    Validate(Target),
    /// Convert source media into every configured target format
    #[command(alias = "convert")]
    Build(Target),
    /// Write metadata tags into source and built media files
    #[command(alias = "addmeta")]
    Tag(Target),
    /// Print the node tree
    Show {
        #[command(flatten)]
        target: Target,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(config: &Config, verbose: bool) {
    // -v beats RUST_LOG, which beats the configured level
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, cli.verbose);

    match commands::run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
