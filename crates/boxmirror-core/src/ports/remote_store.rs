//! Remote store port (driven/secondary port)
//!
//! This module defines the interface the reconciliation engine uses to talk
//! to remote storage. The Dropbox adapter lives in `boxmirror-dropbox`.
//!
//! ## Design Notes
//!
//! - Uses `async_trait` because the engine holds the store as
//!   `Arc<dyn IRemoteStore>` and shares it with transfer tasks.
//! - Uses `anyhow::Result` because error types are adapter-specific.
//! - "Not found" on a metadata lookup is not an error: `get_metadata`
//!   returns `Ok(None)`. Every other failure is an `Err`.

use async_trait::async_trait;

use crate::domain::{entry::Entry, newtypes::RemotePath};

/// One page of a recursive listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Entries on this page, in listing order
    pub entries: Vec<Entry>,
    /// Opaque cursor for fetching the next page
    pub cursor: String,
    /// Whether more pages follow
    pub has_more: bool,
}

/// Port trait for remote storage operations
#[async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Starts a listing of `path`
    ///
    /// # Arguments
    /// * `path` - Folder to list; the root is `/`
    /// * `recursive` - Include every descendant, not only direct children
    /// * `include_deleted` - Include tombstones for deleted entries
    async fn list_folder(
        &self,
        path: &RemotePath,
        recursive: bool,
        include_deleted: bool,
    ) -> anyhow::Result<ListPage>;

    /// Fetches the page following `cursor`
    async fn list_folder_continue(&self, cursor: &str) -> anyhow::Result<ListPage>;

    /// Looks up a single path
    ///
    /// # Returns
    /// `None` when the remote reports the path as not found
    async fn get_metadata(&self, path: &RemotePath) -> anyhow::Result<Option<Entry>>;

    /// Reads a whole file
    async fn download(&self, path: &RemotePath) -> anyhow::Result<Vec<u8>>;

    /// Writes a whole file at `path` in a single request
    async fn upload(&self, data: Vec<u8>, path: &RemotePath) -> anyhow::Result<()>;

    /// Creates a folder at `path`
    async fn create_folder(&self, path: &RemotePath) -> anyhow::Result<()>;
}
