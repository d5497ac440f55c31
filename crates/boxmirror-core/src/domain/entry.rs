//! Remote listing entries
//!
//! A listing yields exactly three kinds of entries. `Entry` is a closed sum
//! type so that folding a listing into a snapshot matches exhaustively.

use super::newtypes::{RemoteKey, RemotePath};

/// A remote file with its byte length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Case-folded path, unique within a snapshot
    pub key: RemoteKey,
    /// Path in display casing
    pub path: RemotePath,
    /// Size in bytes
    pub size: u64,
}

impl FileEntry {
    pub fn new(path: RemotePath, size: u64) -> Self {
        Self {
            key: path.key(),
            path,
            size,
        }
    }
}

/// A remote directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub key: RemoteKey,
    pub path: RemotePath,
}

impl FolderEntry {
    pub fn new(path: RemotePath) -> Self {
        Self {
            key: path.key(),
            path,
        }
    }
}

/// A tombstone: the path no longer exists remotely as of this listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedEntry {
    pub key: RemoteKey,
    pub path: RemotePath,
}

impl DeletedEntry {
    pub fn new(path: RemotePath) -> Self {
        Self {
            key: path.key(),
            path,
        }
    }
}

/// One entry of a remote listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File(FileEntry),
    Folder(FolderEntry),
    Deleted(DeletedEntry),
}

impl Entry {
    /// Shorthand for a file entry keyed by its lowercased path
    pub fn file(path: RemotePath, size: u64) -> Self {
        Self::File(FileEntry::new(path, size))
    }

    /// Shorthand for a folder entry keyed by its lowercased path
    pub fn folder(path: RemotePath) -> Self {
        Self::Folder(FolderEntry::new(path))
    }

    /// Shorthand for a tombstone keyed by its lowercased path
    pub fn deleted(path: RemotePath) -> Self {
        Self::Deleted(DeletedEntry::new(path))
    }

    pub fn key(&self) -> &RemoteKey {
        match self {
            Self::File(e) => &e.key,
            Self::Folder(e) => &e.key,
            Self::Deleted(e) => &e.key,
        }
    }

    pub fn path(&self) -> &RemotePath {
        match self {
            Self::File(e) => &e.path,
            Self::Folder(e) => &e.path,
            Self::Deleted(e) => &e.path,
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}
