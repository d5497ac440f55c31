//! Local snapshot: every regular file and directory under the local root,
//! each paired with the remote path it maps to
//!
//! Entries whose name has no remote form (non UTF-8, or a component the
//! remote rejects) are logged and left out, together with everything
//! below them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use boxmirror_core::{
    domain::newtypes::{RemoteKey, RemotePath},
    ports::local_filesystem::ILocalFileSystem,
};
use tracing::{debug, instrument, warn};

use crate::{path_mapper::PathMapper, SyncError};

/// A local path and its mapped remote path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub local: PathBuf,
    pub remote: RemotePath,
}

/// Result of a full recursive walk of the local root
#[derive(Debug, Clone, Default)]
pub struct LocalSnapshot {
    files: Vec<LocalEntry>,
    dirs: Vec<LocalEntry>,
    by_key: HashMap<RemoteKey, PathBuf>,
}

impl LocalSnapshot {
    /// Walks the mapper's local root; any filesystem error fails the build
    #[instrument(skip(fs, mapper), fields(root = %mapper.local_root().display()))]
    pub async fn build(fs: &dyn ILocalFileSystem, mapper: &PathMapper) -> Result<Self, SyncError> {
        let tree = fs
            .walk(mapper.local_root())
            .await
            .map_err(SyncError::LocalFs)?;

        let mut snapshot = Self::default();
        for dir in tree.dirs {
            if let Some(entry) = map_entry(mapper, dir) {
                snapshot.index(&entry);
                snapshot.dirs.push(entry);
            }
        }
        for file in tree.files {
            if let Some(entry) = map_entry(mapper, file) {
                snapshot.index(&entry);
                snapshot.files.push(entry);
            }
        }

        debug!(
            files = snapshot.files.len(),
            dirs = snapshot.dirs.len(),
            "Local snapshot built"
        );
        Ok(snapshot)
    }

    pub fn files(&self) -> &[LocalEntry] {
        &self.files
    }

    /// Directories, each listed before its descendants
    pub fn dirs(&self) -> &[LocalEntry] {
        &self.dirs
    }

    /// The local file or directory whose remote key is `key`
    ///
    /// When several local names fold to the same key, the first one walked
    /// is returned.
    pub fn find(&self, key: &RemoteKey) -> Option<&Path> {
        self.by_key.get(key).map(PathBuf::as_path)
    }

    fn index(&mut self, entry: &LocalEntry) {
        self.by_key
            .entry(entry.remote.key())
            .or_insert_with(|| entry.local.clone());
    }
}

fn map_entry(mapper: &PathMapper, local: PathBuf) -> Option<LocalEntry> {
    match mapper.local_to_remote(&local) {
        Ok(remote) => Some(LocalEntry { local, remote }),
        Err(e) => {
            warn!(path = %local.display(), error = %e, "Skipping local entry with no remote name");
            None
        }
    }
}
