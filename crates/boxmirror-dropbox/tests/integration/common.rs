//! Shared test helpers for Dropbox API integration tests
//!
//! The RPC host is mounted under `/api/2` and the content host under
//! `/content/2` on the same mock server, so every test also checks that
//! each endpoint goes to the right host.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use boxmirror_core::domain::newtypes::RemotePath;
use boxmirror_dropbox::client::DropboxClient;

pub const TOKEN: &str = "test-access-token";

/// Starts a mock server and returns a client pointing at it
pub async fn setup_dropbox_mock() -> (MockServer, DropboxClient) {
    let server = MockServer::start().await;
    let client = DropboxClient::with_base_urls(
        TOKEN,
        format!("{}/api/2", server.uri()),
        format!("{}/content/2", server.uri()),
    );
    (server, client)
}

/// An authenticated POST to an RPC endpoint
pub fn rpc(endpoint: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path(format!("/api/2/{endpoint}")))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
}

/// An authenticated POST to a content endpoint
pub fn content(endpoint: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path(format!("/content/2/{endpoint}")))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
}

/// A 409 response with the given `error_summary`
pub fn api_error(summary: &str) -> ResponseTemplate {
    ResponseTemplate::new(409).set_body_json(serde_json::json!({
        "error_summary": summary,
        "error": { ".tag": "path" }
    }))
}

pub fn file_json(path_display: &str, size: u64) -> serde_json::Value {
    serde_json::json!({
        ".tag": "file",
        "name": path_display.rsplit('/').next().unwrap_or_default(),
        "path_lower": path_display.to_lowercase(),
        "path_display": path_display,
        "id": format!("id:{path_display}"),
        "size": size,
        "rev": "0123456789abcdef",
        "server_modified": "2026-01-15T10:00:00Z"
    })
}

pub fn folder_json(path_display: &str) -> serde_json::Value {
    serde_json::json!({
        ".tag": "folder",
        "name": path_display.rsplit('/').next().unwrap_or_default(),
        "path_lower": path_display.to_lowercase(),
        "path_display": path_display,
        "id": format!("id:{path_display}")
    })
}

pub fn deleted_json(path_display: &str) -> serde_json::Value {
    serde_json::json!({
        ".tag": "deleted",
        "name": path_display.rsplit('/').next().unwrap_or_default(),
        "path_lower": path_display.to_lowercase(),
        "path_display": path_display
    })
}

pub fn rpath(s: &str) -> RemotePath {
    RemotePath::new(s.to_string()).expect("valid remote path")
}
