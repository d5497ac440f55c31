//! Local filesystem port (driven/secondary port)
//!
//! This module defines the interface for the local side of a mirror:
//! walking the tree, reading and writing whole files, and creating or
//! removing directories.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - All paths are absolute.
//! - Writes go straight to the destination; there is no temporary-file
//!   staging.

use std::path::{Path, PathBuf};

// ============================================================================
// FileSystemState
// ============================================================================

/// State of a single path on the local filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSystemState {
    /// Whether the path exists on disk
    pub exists: bool,
    /// Whether this is a regular file (false for directories and other types)
    pub is_file: bool,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories or non-existent files)
    pub size: u64,
}

impl FileSystemState {
    /// Returns a state representing a non-existent path
    pub fn not_found() -> Self {
        Self {
            exists: false,
            is_file: false,
            is_dir: false,
            size: 0,
        }
    }

    /// Returns true if the path exists and is a regular file
    pub fn is_regular_file(&self) -> bool {
        self.exists && self.is_file
    }

    /// Returns true if the path exists and is a directory
    pub fn is_directory(&self) -> bool {
        self.exists && self.is_dir
    }
}

// ============================================================================
// LocalTree
// ============================================================================

/// Result of a recursive walk
///
/// `dirs` lists every directory before any of its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalTree {
    pub files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
}

// ============================================================================
// ILocalFileSystem trait
// ============================================================================

/// Port trait for local filesystem operations
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Returns the current state of a path
    ///
    /// A missing path is not an error; it yields [`FileSystemState::not_found`].
    async fn state(&self, path: &Path) -> anyhow::Result<FileSystemState>;

    /// Recursively walks `root`, returning every regular file and directory
    /// below it (the root itself is excluded)
    async fn walk(&self, root: &Path) -> anyhow::Result<LocalTree>;

    /// Reads the entire contents of a file
    async fn read_file(&self, path: &Path) -> anyhow::Result<Vec<u8>>;

    /// Writes data to a file, replacing any previous contents
    ///
    /// Parent directories are NOT automatically created.
    async fn write_file(&self, path: &Path, data: &[u8]) -> anyhow::Result<()>;

    /// Creates a single directory; the parent must already exist
    async fn create_dir(&self, path: &Path) -> anyhow::Result<()>;

    /// Removes a single file
    async fn remove_file(&self, path: &Path) -> anyhow::Result<()>;

    /// Removes a directory and everything under it
    async fn remove_dir_all(&self, path: &Path) -> anyhow::Result<()>;
}
