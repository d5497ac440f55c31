//! boxmirror CLI - Mirror a local directory with a Dropbox folder
//!
//! Provides commands for:
//! - Running the mirror loop (or a single pass)
//! - Viewing, validating and editing configuration
//! - Generating shell completions

use std::path::PathBuf;

use anyhow::{Context, Result};
use boxmirror_core::config::{Config, LogFormat, LoggingConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod credentials;
mod output;

use commands::{completions::CompletionsCommand, config::ConfigCommand, sync::SyncCommand};
use output::OutputFormat;

/// Printed when the command line cannot be parsed
const USAGE: &str = "Usage: boxmirror sync <local_root> <remote_root> [-v]";

#[derive(Debug, Parser)]
#[command(
    name = "boxmirror",
    version,
    about = "Keep a local directory and a Dropbox folder mirrored"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Mirror a local directory with a Dropbox folder
    Sync(SyncCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Settings shared by every command
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return Ok(());
        }
        // --help and --version
        Err(e) => {
            e.print().context("Failed to print help")?;
            return Ok(());
        }
    };

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    // An explicit --config must load, except for `config` which reports problems itself.
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() && !matches!(cli.command, Commands::Config(_)) => {
            return Err(e.context(format!(
                "Failed to load configuration from {}",
                config_path.display()
            )));
        }
        Err(_) => Config::default(),
    };

    init_tracing(cli.verbose, &config.logging);

    let ctx = AppContext {
        config,
        config_path,
        format: OutputFormat::from_json_flag(cli.json),
    };

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx),
        Commands::Completions(cmd) => cmd.execute(),
    }
}

/// Installs the global subscriber
///
/// `RUST_LOG` wins over everything; otherwise `-v` selects debug, `-vv`
/// trace, and no flag falls back to the configured level.
fn init_tracing(verbose: u8, logging: &LoggingConfig) {
    let level = filter_for(verbose, &logging.level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn filter_for(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}
