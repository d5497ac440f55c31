//! boxmirror Dropbox - Dropbox HTTP API v2 client
//!
//! Provides async client for:
//! - Recursive folder listings with tombstones and cursor pagination
//! - Metadata lookups, folder creation
//! - Whole-file download and upload through the content host
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client, status mapping and 429 handling
//! - [`listing`] - `list_folder` and `list_folder/continue`
//! - [`files`] - Metadata, download, upload and folder creation
//! - [`provider`] - [`IRemoteStore`](boxmirror_core::ports::remote_store::IRemoteStore) implementation

pub mod client;
pub mod files;
pub mod listing;
pub mod provider;

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when communicating with the Dropbox API
#[derive(Debug, Error)]
pub enum DropboxError {
    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The access token is missing, invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The path does not exist (`path/not_found`)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The endpoint rejected the call with an API error
    #[error("API error ({status}): {summary}")]
    Api { status: u16, summary: String },

    /// Rate limit exceeded; retry after the specified duration
    #[error("Too many requests, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DropboxError {
    /// Whether this error is the API's "path not found" answer
    pub fn is_not_found(&self) -> bool {
        matches!(self, DropboxError::NotFound(_))
    }
}
