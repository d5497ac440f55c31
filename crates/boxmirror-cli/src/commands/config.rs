//! Config command - View and manage boxmirror configuration
//!
//! Provides the `boxmirror config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Sets individual values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Prints the configuration file path

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use boxmirror_core::config::{Config, LogFormat, TransferMode};
use clap::Subcommand;
use tracing::info;

use crate::AppContext;

/// Keys accepted by `config set`
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("sync.local_root", "Local directory to mirror"),
    ("sync.remote_root", "Dropbox folder to mirror"),
    ("sync.interval_secs", "Seconds between passes"),
    ("transfers.concurrency", "Maximum transfers in flight"),
    ("transfers.mode", "batch|pool"),
    ("remote.token_file", "Access token file"),
    ("remote.api_url", "RPC endpoint base URL"),
    ("remote.content_url", "Content endpoint base URL"),
    ("remote.timeout_secs", "Per-request timeout"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("logging.format", "pretty|json"),
];

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "sync.interval_secs")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub fn execute(&self, ctx: &AppContext) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(ctx),
            ConfigCommand::Set { key, value } => execute_set(ctx, key, value),
            ConfigCommand::Validate => execute_validate(ctx),
            ConfigCommand::Path => execute_path(ctx),
        }
    }
}

fn execute_show(ctx: &AppContext) -> Result<()> {
    let formatter = ctx.format.formatter();
    info!(config_path = %ctx.config_path.display(), "Showing configuration");

    if ctx.format.is_json() {
        let json =
            serde_json::to_value(&ctx.config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
        return Ok(());
    }

    formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
    formatter.info("");
    let yaml =
        serde_yaml::to_string(&ctx.config).context("Failed to serialize configuration to YAML")?;
    for line in yaml.lines() {
        formatter.info(line);
    }
    Ok(())
}

fn execute_set(ctx: &AppContext, key: &str, value: &str) -> Result<()> {
    let formatter = ctx.format.formatter();
    let mut config = ctx.config.clone();

    if let Err(e) = apply_config_value(&mut config, key, value) {
        formatter.error(&format!("Failed to set '{key}': {e}"));
        formatter.info("");
        formatter.info("Supported keys:");
        for (name, help) in SUPPORTED_KEYS {
            formatter.info(&format!("  {name:<24} - {help}"));
        }
        return Ok(());
    }

    let errors: Vec<String> = config.validate().iter().map(|e| e.to_string()).collect();
    if !errors.is_empty() {
        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": false,
                "key": key,
                "value": value,
                "errors": errors,
            }));
        } else {
            formatter.error(&format!("Invalid value for '{key}': {}", errors.join("; ")));
        }
        return Ok(());
    }

    if let Some(parent) = ctx.config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
    std::fs::write(&ctx.config_path, yaml).context("Failed to write configuration file")?;

    info!(key, value, "Configuration value set");
    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "key": key,
            "value": value,
            "config_path": ctx.config_path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Set {key} = {value}"));
        formatter.info(&format!("Saved to {}", ctx.config_path.display()));
    }
    Ok(())
}

fn execute_validate(ctx: &AppContext) -> Result<()> {
    let formatter = ctx.format.formatter();
    let path = ctx.config_path.display().to_string();

    if !ctx.config_path.exists() {
        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "valid": true,
                "config_path": path,
                "errors": [],
                "note": "Configuration file not found. Using defaults.",
            }));
        } else {
            formatter.info(&format!("Configuration file not found at {path}"));
            formatter.info("Using default configuration.");
        }
        return Ok(());
    }

    let config = match Config::load(&ctx.config_path) {
        Ok(config) => config,
        Err(e) => {
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": path,
                    "errors": [format!("Invalid configuration file: {e:#}")],
                }));
            } else {
                formatter.error(&format!("Invalid configuration file: {e:#}"));
                formatter.info(&format!("File: {path}"));
            }
            return Ok(());
        }
    };

    info!(config_path = %path, "Validating configuration");
    let errors = config.validate();

    if ctx.format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": path,
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {path}"));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        formatter.info(&format!("File: {path}"));
        formatter.info("");
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }
    Ok(())
}

fn execute_path(ctx: &AppContext) -> Result<()> {
    if ctx.format.is_json() {
        ctx.format.formatter().print_json(&serde_json::json!({
            "config_path": ctx.config_path.display().to_string(),
            "exists": ctx.config_path.exists(),
        }));
    } else {
        println!("{}", ctx.config_path.display());
    }
    Ok(())
}

/// Applies a dot-notation key/value pair to `config`
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- sync ---
        "sync.local_root" => config.sync.local_root = PathBuf::from(value),
        "sync.remote_root" => config.sync.remote_root = value.to_string(),
        "sync.interval_secs" => {
            config.sync.interval_secs = value
                .parse()
                .context("Expected a positive integer for sync.interval_secs")?;
        }

        // --- transfers ---
        "transfers.concurrency" => {
            config.transfers.concurrency = value
                .parse()
                .context("Expected a positive integer for transfers.concurrency")?;
        }
        "transfers.mode" => {
            config.transfers.mode = match value {
                "batch" => TransferMode::Batch,
                "pool" => TransferMode::Pool,
                other => bail!("Unknown transfer mode '{other}', expected batch or pool"),
            };
        }

        // --- remote ---
        "remote.token_file" => {
            config.remote.token_file = match value {
                "" | "null" => None,
                path => Some(PathBuf::from(path)),
            };
        }
        "remote.api_url" => config.remote.api_url = value.to_string(),
        "remote.content_url" => config.remote.content_url = value.to_string(),
        "remote.timeout_secs" => {
            config.remote.timeout_secs = value
                .parse()
                .context("Expected a positive integer for remote.timeout_secs")?;
        }

        // --- logging ---
        "logging.level" => config.logging.level = value.to_string(),
        "logging.format" => {
            config.logging.format = match value {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                other => bail!("Unknown log format '{other}', expected pretty or json"),
            };
        }

        other => bail!("Unknown configuration key '{other}'"),
    }
    Ok(())
}
