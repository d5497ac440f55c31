//! Remote snapshot
//!
//! Lists the remote root recursively, tombstones included, following the
//! continuation cursor until the store reports no more pages. Entries are
//! folded in listing order into three maps keyed by the case-folded path:
//!
//! - a file or folder entry inserts into its map and clears any tombstone
//!   for the same key
//! - a tombstone inserts into `deleted` and evicts the key from `files` and
//!   `folders`
//!
//! A key therefore never appears in `deleted` and in one of the other maps
//! at the same time.

use std::collections::BTreeMap;

use boxmirror_core::{
    domain::{
        entry::{DeletedEntry, Entry, FileEntry, FolderEntry},
        newtypes::{RemoteKey, RemotePath},
    },
    ports::remote_store::IRemoteStore,
};
use tracing::{debug, instrument};

use crate::SyncError;

/// Classified view of the remote tree at one point in time
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    files: BTreeMap<RemoteKey, FileEntry>,
    folders: BTreeMap<RemoteKey, FolderEntry>,
    deleted: BTreeMap<RemoteKey, DeletedEntry>,
}

impl RemoteSnapshot {
    /// Lists `root` and folds every page into a new snapshot
    ///
    /// Any listing error fails the build; there is no retry here.
    #[instrument(skip(remote), fields(root = %root))]
    pub async fn build(remote: &dyn IRemoteStore, root: &RemotePath) -> Result<Self, SyncError> {
        let mut snapshot = Self::default();

        let mut page = remote
            .list_folder(root, true, true)
            .await
            .map_err(SyncError::Remote)?;
        let mut pages = 1usize;
        snapshot.apply_entries(std::mem::take(&mut page.entries));

        while page.has_more {
            page = remote
                .list_folder_continue(&page.cursor)
                .await
                .map_err(SyncError::Remote)?;
            pages += 1;
            snapshot.apply_entries(std::mem::take(&mut page.entries));
        }

        debug!(
            pages,
            files = snapshot.files.len(),
            folders = snapshot.folders.len(),
            deleted = snapshot.deleted.len(),
            "Remote snapshot built"
        );

        Ok(snapshot)
    }

    /// Folds one page of entries, in order
    pub fn apply_entries(&mut self, entries: impl IntoIterator<Item = Entry>) {
        for entry in entries {
            match entry {
                Entry::File(file) => {
                    self.deleted.remove(&file.key);
                    self.files.insert(file.key.clone(), file);
                }
                Entry::Folder(folder) => {
                    self.deleted.remove(&folder.key);
                    self.folders.insert(folder.key.clone(), folder);
                }
                Entry::Deleted(tombstone) => {
                    self.files.remove(&tombstone.key);
                    self.folders.remove(&tombstone.key);
                    self.deleted.insert(tombstone.key.clone(), tombstone);
                }
            }
        }
    }

    pub fn files(&self) -> &BTreeMap<RemoteKey, FileEntry> {
        &self.files
    }

    pub fn folders(&self) -> &BTreeMap<RemoteKey, FolderEntry> {
        &self.folders
    }

    pub fn deleted(&self) -> &BTreeMap<RemoteKey, DeletedEntry> {
        &self.deleted
    }

    pub fn has_file(&self, key: &RemoteKey) -> bool {
        self.files.contains_key(key)
    }

    pub fn has_folder(&self, key: &RemoteKey) -> bool {
        self.folders.contains_key(key)
    }

    /// Rebuilds `path` with the casing of each ancestor folder entry
    ///
    /// Listings only guarantee display casing for the last component of a
    /// path, so ancestors are taken from their own folder entries. Unknown
    /// ancestors keep the casing found in `path`.
    pub fn display_path(&self, path: &RemotePath) -> RemotePath {
        let components: Vec<&str> = path.components().collect();
        let last = components.len().saturating_sub(1);

        components
            .iter()
            .enumerate()
            .try_fold(RemotePath::root(), |resolved, (i, component)| {
                let candidate = resolved.join(component)?;
                if i == last {
                    return Ok(candidate);
                }
                match self
                    .folders
                    .get(&candidate.key())
                    .and_then(|f| f.path.file_name())
                {
                    Some(name) => resolved.join(name),
                    None => Ok(candidate),
                }
            })
            .unwrap_or_else(|_: boxmirror_core::domain::DomainError| path.clone())
    }

    /// Folders ordered by depth, parents before children
    pub fn folders_by_depth(&self) -> Vec<&FolderEntry> {
        let mut folders: Vec<&FolderEntry> = self.folders.values().collect();
        folders.sort_by(|a, b| {
            a.path
                .depth()
                .cmp(&b.path.depth())
                .then_with(|| a.key.cmp(&b.key))
        });
        folders
    }
}
