//! Transfer jobs and the bounded-concurrency scheduler
//!
//! ## Scheduling
//!
//! - [`TransferMode::Batch`]: jobs are cut into consecutive batches of
//!   `concurrency` jobs. A batch is spawned onto a `JoinSet` and fully
//!   drained before the next batch starts, so one slow job holds back the
//!   following batch even when other slots are idle.
//! - [`TransferMode::Pool`]: every job is spawned at once and waits on a
//!   semaphore with `concurrency` permits, so a slot is refilled as soon as
//!   it frees up.
//!
//! In both modes a failed job is neither retried nor allowed to cancel its
//! siblings. Failures are collected into the [`TransferOutcome`], tagged
//! with the phase that scheduled them.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
pub use boxmirror_core::config::TransferMode;
use boxmirror_core::{
    domain::newtypes::RemotePath,
    ports::{local_filesystem::ILocalFileSystem, remote_store::IRemoteStore},
};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, instrument, warn};

use crate::Phase;

// ============================================================================
// Jobs and outcomes
// ============================================================================

/// A single whole-file transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferJob {
    /// Read `local` fully and write it to `remote` in one request
    Upload { local: PathBuf, remote: RemotePath },
    /// Read `remote` fully and write it to `local`, no temporary file
    Download { local: PathBuf, remote: RemotePath },
}

impl TransferJob {
    pub fn remote(&self) -> &RemotePath {
        match self {
            TransferJob::Upload { remote, .. } | TransferJob::Download { remote, .. } => remote,
        }
    }

    pub fn local(&self) -> &PathBuf {
        match self {
            TransferJob::Upload { local, .. } | TransferJob::Download { local, .. } => local,
        }
    }
}

/// A job that did not complete, with the rendered error chain
#[derive(Debug, Clone)]
pub struct TransferFailure {
    pub phase: Phase,
    pub job: TransferJob,
    pub error: String,
}

/// Result of running a set of jobs to completion
#[derive(Debug, Default)]
pub struct TransferOutcome {
    pub succeeded: usize,
    pub failures: Vec<TransferFailure>,
}

// ============================================================================
// TransferScheduler
// ============================================================================

/// Runs upload/download jobs with at most `concurrency` in flight
#[derive(Clone)]
pub struct TransferScheduler {
    remote: Arc<dyn IRemoteStore>,
    fs: Arc<dyn ILocalFileSystem>,
    concurrency: usize,
    mode: TransferMode,
}

impl TransferScheduler {
    /// A `concurrency` of 0 is treated as 1.
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        fs: Arc<dyn ILocalFileSystem>,
        concurrency: usize,
        mode: TransferMode,
    ) -> Self {
        Self {
            remote,
            fs,
            concurrency: concurrency.max(1),
            mode,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    /// Runs every job to completion and reports what failed
    #[instrument(skip(self, jobs), fields(jobs = jobs.len(), concurrency = self.concurrency, mode = ?self.mode))]
    pub async fn run(&self, phase: Phase, jobs: Vec<TransferJob>) -> TransferOutcome {
        if jobs.is_empty() {
            return TransferOutcome::default();
        }

        let outcome = match self.mode {
            TransferMode::Batch => self.run_batches(phase, jobs).await,
            TransferMode::Pool => self.run_pool(phase, jobs).await,
        };

        debug!(
            succeeded = outcome.succeeded,
            failed = outcome.failures.len(),
            "Transfers complete"
        );
        outcome
    }

    async fn run_batches(&self, phase: Phase, jobs: Vec<TransferJob>) -> TransferOutcome {
        let mut outcome = TransferOutcome::default();

        for (batch_index, batch) in jobs.chunks(self.concurrency).enumerate() {
            debug!(batch = batch_index, size = batch.len(), "Starting transfer batch");

            let mut set = JoinSet::new();
            for (index, job) in batch.iter().cloned().enumerate() {
                let remote = Arc::clone(&self.remote);
                let fs = Arc::clone(&self.fs);
                set.spawn(async move { (index, execute(remote.as_ref(), fs.as_ref(), &job).await) });
            }

            collect(&mut set, phase, batch, &mut outcome).await;
        }

        outcome
    }

    async fn run_pool(&self, phase: Phase, jobs: Vec<TransferJob>) -> TransferOutcome {
        let mut outcome = TransferOutcome::default();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let mut set = JoinSet::new();
        for (index, job) in jobs.iter().cloned().enumerate() {
            let remote = Arc::clone(&self.remote);
            let fs = Arc::clone(&self.fs);
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => execute(remote.as_ref(), fs.as_ref(), &job).await,
                    Err(e) => Err(anyhow::Error::new(e).context("transfer slots closed")),
                };
                (index, result)
            });
        }

        collect(&mut set, phase, &jobs, &mut outcome).await;
        outcome
    }
}

/// Drains `set`, attributing each result to its job by index
///
/// A task that panicked never reports its index; those jobs are recorded
/// as failed once the set is empty.
async fn collect(
    set: &mut JoinSet<(usize, anyhow::Result<()>)>,
    phase: Phase,
    jobs: &[TransferJob],
    outcome: &mut TransferOutcome,
) {
    let mut reported = vec![false; jobs.len()];
    let mut join_errors = Vec::new();

    while let Some(res) = set.join_next().await {
        match res {
            Ok((index, Ok(()))) => {
                reported[index] = true;
                outcome.succeeded += 1;
            }
            Ok((index, Err(e))) => {
                reported[index] = true;
                warn!(path = %jobs[index].remote(), error = %format!("{e:#}"), "Transfer failed");
                outcome.failures.push(TransferFailure {
                    phase,
                    job: jobs[index].clone(),
                    error: format!("{e:#}"),
                });
            }
            Err(e) => join_errors.push(e.to_string()),
        }
    }

    let mut join_errors = join_errors.into_iter();
    for (index, _) in reported.iter().enumerate().filter(|(_, done)| !**done) {
        let error = join_errors
            .next()
            .unwrap_or_else(|| "transfer task did not complete".to_string());
        warn!(path = %jobs[index].remote(), %error, "Transfer task aborted");
        outcome.failures.push(TransferFailure {
            phase,
            job: jobs[index].clone(),
            error,
        });
    }
}

/// Performs one job; the action is logged before it is attempted
async fn execute(
    remote: &dyn IRemoteStore,
    fs: &dyn ILocalFileSystem,
    job: &TransferJob,
) -> anyhow::Result<()> {
    match job {
        TransferJob::Upload { local, remote: path } => {
            debug!(path = %path, "Uploading file");
            let data = fs.read_file(local).await?;
            remote
                .upload(data, path)
                .await
                .with_context(|| format!("Failed to upload {path}"))
        }
        TransferJob::Download { local, remote: path } => {
            debug!(path = %local.display(), "Downloading file");
            let data = remote
                .download(path)
                .await
                .with_context(|| format!("Failed to download {path}"))?;
            fs.write_file(local, &data).await
        }
    }
}
