//! Access token resolution
//!
//! Sources, first match wins:
//! 1. `--token-file <path>`
//! 2. `DROPBOX_TOKEN` environment variable
//! 3. `remote.token_file` from the configuration
//! 4. `token.txt` next to the default configuration file
//!
//! An explicitly named file that cannot be read is an error; only the
//! default location may be absent.

use std::path::Path;

use anyhow::{bail, Context, Result};
use boxmirror_core::config::Config;
use tracing::debug;

/// Environment variable holding an access token
pub const TOKEN_ENV: &str = "DROPBOX_TOKEN";

/// Resolves the token for `config`, honouring the CLI flag and environment
pub fn resolve_token(flag: Option<&Path>, config: &Config) -> Result<String> {
    resolve_token_from(
        flag,
        std::env::var(TOKEN_ENV).ok(),
        config.remote.token_file.as_deref(),
        &Config::default_token_path(),
    )
}

fn resolve_token_from(
    flag: Option<&Path>,
    env: Option<String>,
    configured: Option<&Path>,
    default_path: &Path,
) -> Result<String> {
    if let Some(path) = flag {
        debug!(path = %path.display(), "Reading token from --token-file");
        return read_token_file(path);
    }

    if let Some(value) = env {
        debug!("Using token from {TOKEN_ENV}");
        return non_empty(value.trim().to_string(), TOKEN_ENV);
    }

    if let Some(path) = configured {
        debug!(path = %path.display(), "Reading token from remote.token_file");
        return read_token_file(path);
    }

    if default_path.is_file() {
        debug!(path = %default_path.display(), "Reading token from default location");
        return read_token_file(default_path);
    }

    bail!(
        "No access token found. Write one to {} or set {TOKEN_ENV}",
        default_path.display()
    )
}

fn read_token_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read token file {}", path.display()))?;
    non_empty(content.trim().to_string(), &path.display().to_string())
}

fn non_empty(token: String, source: &str) -> Result<String> {
    if token.is_empty() {
        bail!("Access token from {source} is empty");
    }
    Ok(token)
}
