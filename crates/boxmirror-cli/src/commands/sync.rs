//! Sync command - Mirror a local directory with a Dropbox folder
//!
//! Provides the `boxmirror sync` CLI command which:
//! 1. Merges the command-line roots and overrides into the configuration
//! 2. Resolves the access token and builds the Dropbox store
//! 3. Wires the filesystem adapter, path mapper and transfer scheduler
//!    into a reconciliation engine
//! 4. Runs one pass (`--once`) or the polling loop until SIGINT/SIGTERM

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use boxmirror_core::{config::Config, domain::newtypes::RemotePath, ports::remote_store::IRemoteStore};
use boxmirror_dropbox::{client::DropboxClient, provider::DropboxRemoteStore};
use boxmirror_sync::{
    engine::{PassReport, ReconciliationEngine},
    filesystem::LocalFileSystemAdapter,
    path_mapper::PathMapper,
    sync_loop::SyncLoop,
    transfer::TransferScheduler,
    SyncError,
};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{credentials, output::OutputFormat, AppContext};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Local directory to mirror
    pub local_root: PathBuf,

    /// Dropbox folder to mirror ("/" for the whole account)
    pub remote_root: String,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Seconds to wait between passes
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Maximum transfers in flight
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// File holding the Dropbox access token
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: AppContext) -> Result<()> {
        let formatter = ctx.format.formatter();

        let local_root = tokio::fs::canonicalize(&self.local_root)
            .await
            .with_context(|| format!("Local root {} does not exist", self.local_root.display()))?;
        if !local_root.is_dir() {
            bail!("Local root {} is not a directory", local_root.display());
        }

        let config = self.effective_config(ctx.config, local_root)?;
        let remote_root = config.remote_root()?;

        formatter.success(&format!(
            "Syncing {} {}",
            config.sync.local_root.display(),
            remote_root
        ));

        let token = credentials::resolve_token(self.token_file.as_deref(), &config)?;
        let engine = build_engine(&config, token, remote_root)?;

        if self.once {
            return match engine.run_pass().await {
                Ok(report) => {
                    print_report(ctx.format, &report);
                    Ok(())
                }
                Err(SyncError::TransfersFailed { failures }) => {
                    for failure in &failures {
                        formatter.error(&format!(
                            "{} {}: {}",
                            failure.phase,
                            failure.job.remote(),
                            failure.error
                        ));
                    }
                    bail!("{} transfer job(s) failed", failures.len())
                }
                Err(e) => Err(e.into()),
            };
        }

        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal(signal_token).await;
        });

        let sync_loop = SyncLoop::new(
            engine,
            Duration::from_secs(config.sync.interval_secs),
            shutdown,
        );
        let passes = sync_loop.run().await?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({ "passes": passes }));
        } else {
            formatter.success(&format!("Stopped after {passes} pass(es)"));
        }
        Ok(())
    }

    /// Applies command-line roots and overrides, then validates
    fn effective_config(&self, mut config: Config, local_root: PathBuf) -> Result<Config> {
        config.sync.local_root = local_root;
        config.sync.remote_root = self.remote_root.clone();
        if let Some(interval) = self.interval {
            config.sync.interval_secs = interval;
        }
        if let Some(concurrency) = self.concurrency {
            config.transfers.concurrency = concurrency;
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            bail!("Invalid configuration: {}", messages.join("; "));
        }
        Ok(config)
    }
}

fn build_engine(
    config: &Config,
    token: String,
    remote_root: RemotePath,
) -> Result<ReconciliationEngine> {
    let client = DropboxClient::with_base_urls(
        token,
        config.remote.api_url.as_str(),
        config.remote.content_url.as_str(),
    )
    .with_timeout(Duration::from_secs(config.remote.timeout_secs))
    .context("Failed to build HTTP client")?;

    let remote: Arc<dyn IRemoteStore> = Arc::new(DropboxRemoteStore::new(client));
    let fs = Arc::new(LocalFileSystemAdapter::new());
    let mapper = PathMapper::new(config.sync.local_root.clone(), remote_root)?;
    let scheduler = TransferScheduler::new(
        Arc::clone(&remote),
        fs.clone(),
        config.transfers.concurrency,
        config.transfers.mode,
    );

    info!(
        concurrency = scheduler.concurrency(),
        mode = ?scheduler.mode(),
        "Engine ready"
    );
    Ok(ReconciliationEngine::new(remote, fs, mapper, scheduler))
}

fn print_report(format: OutputFormat, report: &PassReport) {
    let formatter = format.formatter();
    if format.is_json() {
        formatter.print_json(&serde_json::json!({
            "files_deleted": report.delete.files_deleted,
            "dirs_deleted": report.delete.dirs_deleted,
            "remote_folders_created": report.push.remote_folders_created,
            "uploaded": report.push.uploaded,
            "skipped_uploads": report.push.skipped,
            "local_dirs_created": report.pull.local_dirs_created,
            "downloaded": report.pull.downloaded,
            "skipped_downloads": report.pull.skipped,
            "duration_ms": report.duration_ms,
        }));
        return;
    }

    formatter.success(&format!("Pass complete in {} ms", report.duration_ms));
    formatter.info(&format!(
        "Deleted locally: {} file(s), {} folder(s)",
        report.delete.files_deleted, report.delete.dirs_deleted
    ));
    formatter.info(&format!(
        "Pushed: {} folder(s) created, {} file(s) uploaded, {} already present",
        report.push.remote_folders_created, report.push.uploaded, report.push.skipped
    ));
    formatter.info(&format!(
        "Pulled: {} folder(s) created, {} file(s) downloaded, {} up to date",
        report.pull.local_dirs_created, report.pull.downloaded, report.pull.skipped
    ));
}

// ============================================================================
// Shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and cancels `token`
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}
