//! boxmirror configuration
//!
//! One YAML file, four sections (`sync`, `transfers`, `remote`, `logging`).
//! Every section has serde defaults so a partial or missing file still
//! yields a usable [`Config`]; [`Config::validate`] reports what is wrong
//! instead of failing on the first problem.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::newtypes::RemotePath;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for boxmirror.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub transfers: TransfersConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

/// Mirror roots and pass scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Local directory mirrored against the remote root.
    pub local_root: PathBuf,
    /// Remote folder mirrored against the local root. `/` is the storage root.
    pub remote_root: String,
    /// Seconds to sleep between reconciliation passes.
    pub interval_secs: u64,
}

/// How transfer jobs are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Fixed batches of `concurrency` jobs with a join barrier between batches.
    #[default]
    Batch,
    /// Continuously refilled pool of `concurrency` slots.
    Pool,
}

/// Upload/download concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransfersConfig {
    /// Maximum number of transfer jobs in flight.
    pub concurrency: usize,
    pub mode: TransferMode,
}

/// Remote store endpoints and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// File holding the access token. `None` falls back to `$DROPBOX_TOKEN`,
    /// then `token.txt` next to the configuration file.
    pub token_file: Option<PathBuf>,
    /// Base URL of the RPC endpoints.
    pub api_url: String,
    /// Base URL of the content (upload/download) endpoints.
    pub content_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when neither `RUST_LOG` nor `-v` is given.
    pub level: String,
    pub format: LogFormat,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Reads and parses the YAML file at `path`. Missing keys take defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// [`Config::load`], or the defaults when the file is absent or broken.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// `<config dir>/boxmirror/config.yaml`, e.g. `~/.config/boxmirror/config.yaml`.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Default location of the access token file.
    pub fn default_token_path() -> PathBuf {
        Self::config_dir().join("token.txt")
    }

    fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("boxmirror")
    }

    /// The configured remote root, normalized.
    pub fn remote_root(&self) -> Result<RemotePath, crate::domain::DomainError> {
        RemotePath::normalize(&self.sync.remote_root)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Seconds between passes when nothing else is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 120;

/// Transfer jobs in flight when nothing else is configured.
pub const DEFAULT_CONCURRENCY: usize = 4;

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            local_root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Dropbox"),
            remote_root: "/".to_string(),
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl Default for TransfersConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            mode: TransferMode::Batch,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            token_file: None,
            api_url: "https://api.dropboxapi.com/2".to_string(),
            content_url: "https://content.dropboxapi.com/2".to_string(),
            timeout_secs: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// One problem reported by [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.interval_secs"`.
    pub field: String,
    /// What is wrong with the value.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accepted `logging.level` values.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `transfers.concurrency`.
const MAX_CONCURRENCY: usize = 64;

impl Config {
    /// Checks every section and collects all problems; empty means usable.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if self.sync.interval_secs == 0 {
            errors.push(ValidationError {
                field: "sync.interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if !self.sync.local_root.is_absolute() {
            errors.push(ValidationError {
                field: "sync.local_root".into(),
                message: format!(
                    "must be an absolute path: {}",
                    self.sync.local_root.display()
                ),
            });
        }
        if let Err(e) = self.remote_root() {
            errors.push(ValidationError {
                field: "sync.remote_root".into(),
                message: e.to_string(),
            });
        }

        // --- transfers ---
        if self.transfers.concurrency == 0 || self.transfers.concurrency > MAX_CONCURRENCY {
            errors.push(ValidationError {
                field: "transfers.concurrency".into(),
                message: format!("must be between 1 and {MAX_CONCURRENCY}"),
            });
        }

        // --- remote ---
        for (field, value) in [
            ("remote.api_url", &self.remote.api_url),
            ("remote.content_url", &self.remote.content_url),
        ] {
            match url::Url::parse(value) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                Ok(parsed) => errors.push(ValidationError {
                    field: field.into(),
                    message: format!("unsupported scheme '{}'", parsed.scheme()),
                }),
                Err(e) => errors.push(ValidationError {
                    field: field.into(),
                    message: format!("invalid URL: {e}"),
                }),
            }
        }
        if self.remote.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "remote.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "must be one of: {}; got '{}'",
                    VALID_LOG_LEVELS.join(", "),
                    self.logging.level
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Programmatic [`Config`] construction on top of the defaults
///
/// # Example
///
/// ```rust,no_run
/// use boxmirror_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let cfg = ConfigBuilder::new()
///     .local_root(PathBuf::from("/home/user/Dropbox"))
///     .remote_root("/Backups")
///     .interval_secs(60)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn local_root(mut self, root: PathBuf) -> Self {
        self.config.sync.local_root = root;
        self
    }

    pub fn remote_root(mut self, root: impl Into<String>) -> Self {
        self.config.sync.remote_root = root.into();
        self
    }

    pub fn interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.interval_secs = seconds;
        self
    }

    // --- transfers ---

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.transfers.concurrency = n;
        self
    }

    pub fn transfer_mode(mut self, mode: TransferMode) -> Self {
        self.config.transfers.mode = mode;
        self
    }

    // --- remote ---

    pub fn token_file(mut self, path: PathBuf) -> Self {
        self.config.remote.token_file = Some(path);
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.api_url = url.into();
        self
    }

    pub fn content_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.content_url = url.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    // --- build ---

    pub fn build(self) -> Config {
        self.config
    }

    /// Like [`ConfigBuilder::build`], but fails with every validation problem.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        match self.config.validate() {
            errors if errors.is_empty() => Ok(self.config),
            errors => Err(errors),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
