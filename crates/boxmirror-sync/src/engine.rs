//! Reconciliation engine
//!
//! The [`ReconciliationEngine`] mirrors a local root and a remote root by
//! running three phases, always in this order:
//!
//! 1. **DeleteLocal**: remove local files that have a remote tombstone and
//!    local directories with no remote folder counterpart
//! 2. **PushLocalOnly**: create missing remote folders, upload local files
//!    whose remote path is absent
//! 3. **PullRemoteOnly**: create missing local directories, download remote
//!    files that are missing locally or differ in size
//!
//! Deletions run first so that a file removed remotely is gone locally
//! before the push phase looks for local-only files. Each phase rebuilds
//! both snapshots from scratch.
//!
//! Local paths are matched to remote keys without regard to case, so a
//! local `Docs/` stands for a remote `/docs` and is neither duplicated nor
//! deleted.
//!
//! Transfer failures do not stop the other jobs of a phase, nor the phases
//! after it. They are returned together as [`SyncError::TransfersFailed`]
//! once the pass is over.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use boxmirror_core::{
    domain::newtypes::RemotePath,
    ports::{
        local_filesystem::{FileSystemState, ILocalFileSystem},
        remote_store::IRemoteStore,
    },
};
use tracing::{debug, info, instrument, warn};

use crate::{
    local_snapshot::LocalSnapshot,
    path_mapper::PathMapper,
    remote_snapshot::RemoteSnapshot,
    transfer::{TransferFailure, TransferJob, TransferScheduler},
    Phase, SyncError,
};

// ============================================================================
// Reports
// ============================================================================

/// Actions taken by DeleteLocal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub files_deleted: usize,
    pub dirs_deleted: usize,
}

/// Actions taken by PushLocalOnly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    pub remote_folders_created: usize,
    pub uploaded: usize,
    /// Local files already present remotely
    pub skipped: usize,
}

/// Actions taken by PullRemoteOnly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    pub local_dirs_created: usize,
    pub downloaded: usize,
    /// Remote files present locally with a matching size
    pub skipped: usize,
}

/// Summary of a completed reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub delete: DeleteReport,
    pub push: PushReport,
    pub pull: PullReport,
    /// Wall-clock duration of the pass in milliseconds
    pub duration_ms: u64,
}

impl PassReport {
    /// Whether the pass changed anything on either side
    pub fn is_noop(&self) -> bool {
        self.delete == DeleteReport::default()
            && self.push.remote_folders_created == 0
            && self.push.uploaded == 0
            && self.pull.local_dirs_created == 0
            && self.pull.downloaded == 0
    }
}

// ============================================================================
// ReconciliationEngine
// ============================================================================

/// Three-phase mirror between one local root and one remote root
pub struct ReconciliationEngine {
    remote: Arc<dyn IRemoteStore>,
    fs: Arc<dyn ILocalFileSystem>,
    mapper: PathMapper,
    scheduler: TransferScheduler,
}

impl ReconciliationEngine {
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        fs: Arc<dyn ILocalFileSystem>,
        mapper: PathMapper,
        scheduler: TransferScheduler,
    ) -> Self {
        Self {
            remote,
            fs,
            mapper,
            scheduler,
        }
    }

    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Runs DeleteLocal, PushLocalOnly and PullRemoteOnly in order
    ///
    /// Transfer failures in PushLocalOnly do not keep PullRemoteOnly from
    /// running; the failures of both phases are returned together once the
    /// pass is over. Any other error ends the pass at once.
    #[instrument(skip(self), fields(local_root = %self.mapper.local_root().display(), remote_root = %self.mapper.remote_root()))]
    pub async fn run_pass(&self) -> Result<PassReport, SyncError> {
        let start = Instant::now();

        if !self.local_state(self.mapper.local_root()).await?.is_directory() {
            return Err(SyncError::LocalRootMissing(
                self.mapper.local_root().to_path_buf(),
            ));
        }

        info!("Starting reconciliation pass");

        let delete = self.delete_local().await?;
        let (push, mut failures) = self.push_phase().await?;
        let (pull, pull_failures) = self.pull_phase().await?;
        failures.extend(pull_failures);

        let report = PassReport {
            delete,
            push,
            pull,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            files_deleted = report.delete.files_deleted,
            dirs_deleted = report.delete.dirs_deleted,
            remote_folders_created = report.push.remote_folders_created,
            uploaded = report.push.uploaded,
            local_dirs_created = report.pull.local_dirs_created,
            downloaded = report.pull.downloaded,
            failed = failures.len(),
            duration_ms = report.duration_ms,
            "Reconciliation pass complete"
        );

        SyncError::check_transfers(report, failures)
    }

    /// Removes local files with a remote tombstone and local directories
    /// whose remote folder is gone
    #[instrument(skip(self))]
    pub async fn delete_local(&self) -> Result<DeleteReport, SyncError> {
        let (remote, local) = self.snapshots().await?;
        let mut report = DeleteReport::default();

        for tombstone in remote.deleted().values() {
            let path = self.local_path(&remote, &local, &tombstone.path)?;
            if self.local_state(&path).await?.is_regular_file() {
                debug!(path = %path.display(), "Deleting file");
                self.fs
                    .remove_file(&path)
                    .await
                    .map_err(SyncError::LocalFs)?;
                report.files_deleted += 1;
            }
        }

        for dir in local.dirs() {
            if remote.has_folder(&dir.remote.key()) {
                continue;
            }
            // A parent removed earlier in this loop takes its children with it.
            if self.local_state(&dir.local).await?.is_directory() {
                debug!(path = %dir.local.display(), "Deleting folder");
                self.fs
                    .remove_dir_all(&dir.local)
                    .await
                    .map_err(SyncError::LocalFs)?;
                report.dirs_deleted += 1;
            }
        }

        debug!(
            files_deleted = report.files_deleted,
            dirs_deleted = report.dirs_deleted,
            "DeleteLocal done"
        );
        Ok(report)
    }

    /// Creates missing remote folders, then uploads local-only files
    pub async fn push_local_only(&self) -> Result<PushReport, SyncError> {
        let (report, failures) = self.push_phase().await?;
        SyncError::check_transfers(report, failures)
    }

    /// Creates missing local directories, then downloads files that are
    /// missing locally or whose size differs
    pub async fn pull_remote_only(&self) -> Result<PullReport, SyncError> {
        let (report, failures) = self.pull_phase().await?;
        SyncError::check_transfers(report, failures)
    }

    #[instrument(skip(self))]
    async fn push_phase(&self) -> Result<(PushReport, Vec<TransferFailure>), SyncError> {
        let (remote, local) = self.snapshots().await?;
        let mut report = PushReport::default();

        for dir in local.dirs() {
            if self
                .mapper
                .remote_path_exists(self.remote.as_ref(), &dir.remote)
                .await?
            {
                debug!(path = %dir.remote, "Skipping folder");
                continue;
            }

            debug!(path = %dir.remote, "Creating remote folder");
            self.remote
                .create_folder(&dir.remote)
                .await
                .map_err(SyncError::Remote)?;
            report.remote_folders_created += 1;
        }

        let mut jobs = Vec::new();
        for file in local.files() {
            if remote.has_file(&file.remote.key()) {
                debug!(path = %file.remote, "Skipping file");
                report.skipped += 1;
            } else {
                jobs.push(TransferJob::Upload {
                    local: file.local.clone(),
                    remote: file.remote.clone(),
                });
            }
        }

        let outcome = self.scheduler.run(Phase::PushLocalOnly, jobs).await;
        report.uploaded = outcome.succeeded;

        debug!(
            remote_folders_created = report.remote_folders_created,
            uploaded = report.uploaded,
            skipped = report.skipped,
            failed = outcome.failures.len(),
            "PushLocalOnly done"
        );
        Ok((report, outcome.failures))
    }

    #[instrument(skip(self))]
    async fn pull_phase(&self) -> Result<(PullReport, Vec<TransferFailure>), SyncError> {
        let (remote, local) = self.snapshots().await?;
        let mut report = PullReport::default();

        for folder in remote.folders_by_depth() {
            let path = self.local_path(&remote, &local, &folder.path)?;
            let state = self.local_state(&path).await?;
            if state.is_directory() {
                continue;
            }
            if state.exists {
                warn!(path = %path.display(), "Local file is in the way of a remote folder");
                continue;
            }

            debug!(path = %path.display(), "Creating folder");
            self.fs
                .create_dir(&path)
                .await
                .map_err(SyncError::LocalFs)?;
            report.local_dirs_created += 1;
        }

        let mut jobs = Vec::new();
        for file in remote.files().values() {
            let path = self.local_path(&remote, &local, &file.path)?;
            let state = self.local_state(&path).await?;
            if state.is_regular_file() && state.size == file.size {
                debug!(path = %path.display(), "Skipping file");
                report.skipped += 1;
            } else {
                jobs.push(TransferJob::Download {
                    local: path,
                    remote: file.path.clone(),
                });
            }
        }

        let outcome = self.scheduler.run(Phase::PullRemoteOnly, jobs).await;
        report.downloaded = outcome.succeeded;

        debug!(
            local_dirs_created = report.local_dirs_created,
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = outcome.failures.len(),
            "PullRemoteOnly done"
        );
        Ok((report, outcome.failures))
    }

    async fn snapshots(&self) -> Result<(RemoteSnapshot, LocalSnapshot), SyncError> {
        let remote = RemoteSnapshot::build(self.remote.as_ref(), self.mapper.remote_root()).await?;
        let local = LocalSnapshot::build(self.fs.as_ref(), &self.mapper).await?;
        Ok((remote, local))
    }

    /// Local path for a remote path
    ///
    /// The nearest ancestor (or the path itself) that already exists locally
    /// under any casing keeps its local name; the remaining components take
    /// the remote display casing.
    fn local_path(
        &self,
        remote: &RemoteSnapshot,
        local: &LocalSnapshot,
        path: &RemotePath,
    ) -> Result<PathBuf, SyncError> {
        let root = self.mapper.remote_root().key();
        let mut cursor = remote.display_path(path);
        let mut tail = Vec::new();

        let mut base = loop {
            if let Some(existing) = local.find(&cursor.key()) {
                break existing.to_path_buf();
            }
            if cursor.key() == root {
                break self.mapper.local_root().to_path_buf();
            }
            let name = cursor.file_name().map(str::to_string);
            match (cursor.parent(), name) {
                (Some(parent), Some(name)) => {
                    tail.push(name);
                    cursor = parent;
                }
                _ => break self.mapper.remote_to_local(&cursor)?,
            }
        };

        base.extend(tail.iter().rev());
        Ok(base)
    }

    async fn local_state(&self, path: &Path) -> Result<FileSystemState, SyncError> {
        self.fs.state(path).await.map_err(SyncError::LocalFs)
    }
}
