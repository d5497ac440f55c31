//! File and folder operations
//!
//! - [`get_metadata`] - Existence check; `path/not_found` becomes `Ok(None)`
//! - [`download`] - Whole-file download from the content host
//! - [`upload`] - Single-request upload in `add` mode (never overwrites)
//! - [`create_folder`] - `create_folder_v2` without autorename
//!
//! Uploads go through `files/upload`, which accepts up to 150 MiB per
//! request. Larger files need an upload session and are rejected here.

use boxmirror_core::{domain::entry::Entry, domain::newtypes::RemotePath};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    client::DropboxClient,
    listing::{api_path, Metadata},
    DropboxError,
};

/// Largest body accepted by a single `files/upload` request: 150 MiB
pub const MAX_SINGLE_UPLOAD: usize = 150 * 1024 * 1024;

#[derive(Debug, Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct UploadArg<'a> {
    path: &'a str,
    mode: &'static str,
    autorename: bool,
    mute: bool,
}

#[derive(Debug, Serialize)]
struct CreateFolderArg<'a> {
    path: &'a str,
    autorename: bool,
}

/// Looks up a single path
///
/// # Returns
/// `None` when the path does not exist
#[instrument(skip(client), fields(path = %path))]
pub async fn get_metadata(
    client: &DropboxClient,
    path: &RemotePath,
) -> Result<Option<Entry>, DropboxError> {
    let result: Result<Metadata, DropboxError> = client
        .rpc("files/get_metadata", &PathArg { path: path.as_str() })
        .await;

    match result {
        Ok(metadata) => metadata.into_entry().map(Some),
        Err(e) if e.is_not_found() => {
            debug!("Path not found");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Downloads the full content of a file
#[instrument(skip(client), fields(path = %path))]
pub async fn download(client: &DropboxClient, path: &RemotePath) -> Result<Vec<u8>, DropboxError> {
    let response = client
        .content("files/download", &PathArg { path: path.as_str() }, None)
        .await?;

    let bytes = response.bytes().await?;
    debug!(bytes = bytes.len(), "Downloaded file");
    Ok(bytes.to_vec())
}

/// Uploads `data` as a new file at `path`
///
/// Uses `add` mode, so an existing file at the path is a conflict error
/// rather than being overwritten.
#[instrument(skip(client, data), fields(path = %path, bytes = data.len()))]
pub async fn upload(
    client: &DropboxClient,
    data: Vec<u8>,
    path: &RemotePath,
) -> Result<(), DropboxError> {
    if data.len() > MAX_SINGLE_UPLOAD {
        return Err(DropboxError::Api {
            status: 413,
            summary: format!(
                "{} bytes exceeds the single-request upload limit of {} bytes",
                data.len(),
                MAX_SINGLE_UPLOAD
            ),
        });
    }

    let arg = UploadArg {
        path: path.as_str(),
        mode: "add",
        autorename: false,
        mute: true,
    };
    client.content("files/upload", &arg, Some(data)).await?;
    debug!("Uploaded file");
    Ok(())
}

/// Creates a folder; fails if anything already exists at `path`
#[instrument(skip(client), fields(path = %path))]
pub async fn create_folder(client: &DropboxClient, path: &RemotePath) -> Result<(), DropboxError> {
    let _: serde_json::Value = client
        .rpc(
            "files/create_folder_v2",
            &CreateFolderArg {
                path: api_path(path),
                autorename: false,
            },
        )
        .await?;
    debug!("Created folder");
    Ok(())
}
