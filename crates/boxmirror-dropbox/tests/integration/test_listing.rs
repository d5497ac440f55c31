//! Integration tests for folder listings, pagination and status mapping

use std::time::Duration;

use boxmirror_core::{domain::entry::Entry, ports::remote_store::IRemoteStore};
use boxmirror_dropbox::{listing, provider::DropboxRemoteStore, DropboxError};
use serde_json::json;
use wiremock::matchers::body_json;
use wiremock::ResponseTemplate;

use crate::common::{self, deleted_json, file_json, folder_json, rpath};

#[tokio::test]
async fn test_list_root_sends_empty_path_and_maps_entries() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/list_folder")
        .and(body_json(json!({
            "path": "",
            "recursive": true,
            "include_deleted": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [
                folder_json("/Sub"),
                file_json("/Sub/b.txt", 5),
                file_json("/a.txt", 10),
                deleted_json("/gone.txt")
            ],
            "cursor": "cursor-1",
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = listing::list_folder(&client, &rpath("/"), true, true)
        .await
        .expect("list_folder failed");

    assert_eq!(page.cursor, "cursor-1");
    assert!(!page.has_more);
    assert_eq!(page.entries.len(), 4);
    assert!(page.entries[0].is_folder());
    match &page.entries[2] {
        Entry::File(file) => {
            assert_eq!(file.path.as_str(), "/a.txt");
            assert_eq!(file.size, 10);
        }
        other => panic!("expected file, got {other:?}"),
    }
    assert!(matches!(page.entries[3], Entry::Deleted(_)));
}

#[tokio::test]
async fn test_list_sub_folder_sends_its_path() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/list_folder")
        .and(body_json(json!({
            "path": "/Backups",
            "recursive": true,
            "include_deleted": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [folder_json("/Backups")],
            "cursor": "c",
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = listing::list_folder(&client, &rpath("/Backups"), true, false)
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 1);
}

#[tokio::test]
async fn test_store_follows_continue_cursor() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/list_folder")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [file_json("/one.txt", 1)],
            "cursor": "page-1",
            "has_more": true
        })))
        .mount(&server)
        .await;

    common::rpc("files/list_folder/continue")
        .and(body_json(json!({ "cursor": "page-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [file_json("/two.txt", 2), deleted_json("/one.txt")],
            "cursor": "page-2",
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = DropboxRemoteStore::new(client);
    let first = store.list_folder(&rpath("/"), true, true).await.unwrap();
    assert!(first.has_more);

    let second = store.list_folder_continue(&first.cursor).await.unwrap();
    assert!(!second.has_more);
    assert_eq!(second.cursor, "page-2");
    assert_eq!(second.entries.len(), 2);
    assert_eq!(second.entries[1].key().as_str(), "/one.txt");
}

#[tokio::test]
async fn test_unauthorized_maps_to_error() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/list_folder")
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error_summary": "invalid_access_token/",
            "error": { ".tag": "invalid_access_token" }
        })))
        .mount(&server)
        .await;

    let err = listing::list_folder(&client, &rpath("/"), true, true)
        .await
        .unwrap_err();
    match err {
        DropboxError::Unauthorized(summary) => assert_eq!(summary, "invalid_access_token/"),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn test_expired_cursor_is_api_error() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/list_folder/continue")
        .respond_with(common::api_error("reset/.."))
        .mount(&server)
        .await;

    let err = listing::list_folder_continue(&client, "stale")
        .await
        .unwrap_err();
    assert!(matches!(err, DropboxError::Api { status: 409, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_server_error_maps_to_error() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/list_folder")
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = listing::list_folder(&client, &rpath("/"), true, true)
        .await
        .unwrap_err();
    match err {
        DropboxError::ServerError(message) => {
            assert!(message.contains("503"));
            assert!(message.contains("upstream unavailable"));
        }
        other => panic!("expected ServerError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/list_folder")
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    common::rpc("files/list_folder")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [],
            "cursor": "c",
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = listing::list_folder(&client, &rpath("/"), true, true)
        .await
        .expect("retry after 429 should succeed");
    assert!(page.entries.is_empty());
}

#[tokio::test]
async fn test_rate_limit_retries_are_bounded() {
    let (server, client) = common::setup_dropbox_mock().await;
    let client = client.with_max_retries(2);

    common::rpc("files/list_folder")
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let err = listing::list_folder(&client, &rpath("/"), true, true)
        .await
        .unwrap_err();
    match err {
        DropboxError::RateLimited { retry_after } => assert_eq!(retry_after, Duration::ZERO),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/list_folder")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let err = listing::list_folder(&client, &rpath("/"), true, true)
        .await
        .unwrap_err();
    assert!(matches!(err, DropboxError::InvalidResponse(_)));
}
