//! Folder listings
//!
//! `files/list_folder` returns the first page of entries under a path;
//! `files/list_folder/continue` follows the returned cursor while
//! `has_more` is true. Each entry is tagged by `.tag`:
//!
//! | `.tag`    | Fields used                             |
//! |-----------|-----------------------------------------|
//! | `file`    | `path_display`, `path_lower`, `size`    |
//! | `folder`  | `path_display`, `path_lower`            |
//! | `deleted` | `path_display`, `path_lower`            |
//!
//! ## Dropbox API References
//!
//! - [list_folder](https://www.dropbox.com/developers/documentation/http/documentation#files-list_folder)
//! - [list_folder/continue](https://www.dropbox.com/developers/documentation/http/documentation#files-list_folder-continue)

use boxmirror_core::{domain::entry::Entry, domain::newtypes::RemotePath, ports::remote_store::ListPage};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{client::DropboxClient, DropboxError};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ListFolderArg<'a> {
    path: &'a str,
    recursive: bool,
    include_deleted: bool,
}

#[derive(Debug, Serialize)]
struct ListFolderContinueArg<'a> {
    cursor: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<Metadata>,
    cursor: String,
    has_more: bool,
}

/// One listing entry as returned by the API
#[derive(Debug, Deserialize)]
#[serde(tag = ".tag", rename_all = "lowercase")]
pub(crate) enum Metadata {
    File {
        path_display: Option<String>,
        path_lower: Option<String>,
        size: u64,
    },
    Folder {
        path_display: Option<String>,
        path_lower: Option<String>,
    },
    Deleted {
        path_display: Option<String>,
        path_lower: Option<String>,
    },
}

impl Metadata {
    /// Converts to a domain entry, preferring the display path
    pub(crate) fn into_entry(self) -> Result<Entry, DropboxError> {
        match self {
            Metadata::File {
                path_display,
                path_lower,
                size,
            } => Ok(Entry::file(entry_path(path_display, path_lower)?, size)),
            Metadata::Folder {
                path_display,
                path_lower,
            } => Ok(Entry::folder(entry_path(path_display, path_lower)?)),
            Metadata::Deleted {
                path_display,
                path_lower,
            } => Ok(Entry::deleted(entry_path(path_display, path_lower)?)),
        }
    }
}

fn entry_path(display: Option<String>, lower: Option<String>) -> Result<RemotePath, DropboxError> {
    let raw = display
        .or(lower)
        .ok_or_else(|| DropboxError::InvalidResponse("entry without a path".to_string()))?;
    RemotePath::new(raw.clone())
        .map_err(|e| DropboxError::InvalidResponse(format!("bad entry path {raw:?}: {e}")))
}

/// The API names the storage root `""` rather than `"/"`
pub(crate) fn api_path(path: &RemotePath) -> &str {
    if path.is_root() {
        ""
    } else {
        path.as_str()
    }
}

fn into_page(result: ListFolderResult) -> Result<ListPage, DropboxError> {
    let entries = result
        .entries
        .into_iter()
        .map(Metadata::into_entry)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ListPage {
        entries,
        cursor: result.cursor,
        has_more: result.has_more,
    })
}

// ============================================================================
// Operations
// ============================================================================

/// Fetches the first page of a listing
#[instrument(skip(client), fields(path = %path))]
pub async fn list_folder(
    client: &DropboxClient,
    path: &RemotePath,
    recursive: bool,
    include_deleted: bool,
) -> Result<ListPage, DropboxError> {
    let result: ListFolderResult = client
        .rpc(
            "files/list_folder",
            &ListFolderArg {
                path: api_path(path),
                recursive,
                include_deleted,
            },
        )
        .await?;

    debug!(
        entries = result.entries.len(),
        has_more = result.has_more,
        "Listed folder"
    );
    into_page(result)
}

/// Fetches the page after `cursor`
#[instrument(skip(client, cursor))]
pub async fn list_folder_continue(
    client: &DropboxClient,
    cursor: &str,
) -> Result<ListPage, DropboxError> {
    let result: ListFolderResult = client
        .rpc("files/list_folder/continue", &ListFolderContinueArg { cursor })
        .await?;

    debug!(
        entries = result.entries.len(),
        has_more = result.has_more,
        "Listed folder continuation"
    );
    into_page(result)
}
