//! boxmirror Sync - Local/remote mirror reconciliation
//!
//! Provides:
//! - Remote and local snapshots rebuilt from scratch for every phase
//! - Prefix-based path mapping between the two roots
//! - A bounded-concurrency transfer scheduler
//! - The three-phase reconciliation engine and the polling loop around it
//!
//! ## Modules
//!
//! - [`remote_snapshot`] - Paginated recursive listing folded into files/folders/tombstones
//! - [`local_snapshot`] - Recursive walk of the local root
//! - [`path_mapper`] - Remote/local path translation and remote existence check
//! - [`transfer`] - Upload/download jobs and the batch scheduler
//! - [`engine`] - DeleteLocal, PushLocalOnly and PullRemoteOnly phases
//! - [`sync_loop`] - Fixed-interval pass loop with clean shutdown
//! - [`filesystem`] - Local filesystem adapter over `tokio::fs`

pub mod engine;
pub mod filesystem;
pub mod local_snapshot;
pub mod path_mapper;
pub mod remote_snapshot;
pub mod sync_loop;
pub mod transfer;

use std::fmt;
use std::path::PathBuf;

use boxmirror_core::domain::errors::DomainError;
use thiserror::Error;

use crate::transfer::TransferFailure;

/// The three reconciliation phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    DeleteLocal,
    PushLocalOnly,
    PullRemoteOnly,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::DeleteLocal => "delete-local",
            Phase::PushLocalOnly => "push-local-only",
            Phase::PullRemoteOnly => "pull-remote-only",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during a reconciliation pass
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local root is missing or not a directory
    #[error("Local root is not a directory: {0}")]
    LocalRootMissing(PathBuf),

    /// A remote store call failed (listing, metadata lookup, folder creation)
    #[error("Remote store error: {0:#}")]
    Remote(anyhow::Error),

    /// A local filesystem call failed (walk, mkdir, delete)
    #[error("Local filesystem error: {0:#}")]
    LocalFs(anyhow::Error),

    /// One or more transfer jobs failed; every other job still ran
    #[error("{} transfer job(s) failed", failures.len())]
    TransfersFailed { failures: Vec<TransferFailure> },

    /// A domain-level error propagated from boxmirror-core
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
}

impl SyncError {
    /// Whether the sync loop may carry on with the next pass
    ///
    /// Only collected job failures are recoverable; every other error means
    /// the pass could not establish a consistent view of either side.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SyncError::TransfersFailed { .. })
    }

    /// `Ok(value)` when `failures` is empty, otherwise [`SyncError::TransfersFailed`]
    pub(crate) fn check_transfers<T>(
        value: T,
        failures: Vec<TransferFailure>,
    ) -> Result<T, SyncError> {
        if failures.is_empty() {
            Ok(value)
        } else {
            Err(SyncError::TransfersFailed { failures })
        }
    }
}
