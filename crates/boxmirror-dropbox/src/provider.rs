//! DropboxRemoteStore - IRemoteStore implementation for the Dropbox API
//!
//! Wraps the [`DropboxClient`] and delegates to the listing and files
//! modules. Every method takes `&self` and the client is shared without a
//! lock; `reqwest::Client` pools connections internally, so concurrent
//! transfer jobs each get their own request.

use anyhow::{Context, Result};
use async_trait::async_trait;
use boxmirror_core::{
    domain::{entry::Entry, newtypes::RemotePath},
    ports::remote_store::{IRemoteStore, ListPage},
};
use tracing::debug;

use crate::{client::DropboxClient, files, listing};

/// Remote store backed by a Dropbox account
pub struct DropboxRemoteStore {
    client: DropboxClient,
}

impl DropboxRemoteStore {
    pub fn new(client: DropboxClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DropboxClient {
        &self.client
    }
}

#[async_trait]
impl IRemoteStore for DropboxRemoteStore {
    async fn list_folder(
        &self,
        path: &RemotePath,
        recursive: bool,
        include_deleted: bool,
    ) -> Result<ListPage> {
        debug!(path = %path, recursive, include_deleted, "DropboxRemoteStore::list_folder");
        listing::list_folder(&self.client, path, recursive, include_deleted)
            .await
            .with_context(|| format!("Failed to list {path}"))
    }

    async fn list_folder_continue(&self, cursor: &str) -> Result<ListPage> {
        listing::list_folder_continue(&self.client, cursor)
            .await
            .context("Failed to continue listing")
    }

    async fn get_metadata(&self, path: &RemotePath) -> Result<Option<Entry>> {
        files::get_metadata(&self.client, path)
            .await
            .with_context(|| format!("Failed to get metadata for {path}"))
    }

    async fn download(&self, path: &RemotePath) -> Result<Vec<u8>> {
        files::download(&self.client, path)
            .await
            .with_context(|| format!("Failed to download {path}"))
    }

    async fn upload(&self, data: Vec<u8>, path: &RemotePath) -> Result<()> {
        files::upload(&self.client, data, path)
            .await
            .with_context(|| format!("Failed to upload {path}"))
    }

    async fn create_folder(&self, path: &RemotePath) -> Result<()> {
        files::create_folder(&self.client, path)
            .await
            .with_context(|| format!("Failed to create folder {path}"))
    }
}
