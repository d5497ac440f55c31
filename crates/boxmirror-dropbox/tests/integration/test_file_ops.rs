//! Integration tests for metadata, download, upload and folder creation

use boxmirror_core::{domain::entry::Entry, ports::remote_store::IRemoteStore};
use boxmirror_dropbox::{files, provider::DropboxRemoteStore, DropboxError};
use serde_json::json;
use wiremock::matchers::{body_bytes, body_json, header};
use wiremock::ResponseTemplate;

use crate::common::{self, file_json, folder_json, rpath};

// ============================================================================
// get_metadata
// ============================================================================

#[tokio::test]
async fn test_get_metadata_returns_entry() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/get_metadata")
        .and(body_json(json!({ "path": "/Docs" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_json("/Docs")))
        .expect(1)
        .mount(&server)
        .await;

    let entry = files::get_metadata(&client, &rpath("/Docs")).await.unwrap();
    match entry {
        Some(Entry::Folder(folder)) => assert_eq!(folder.path.as_str(), "/Docs"),
        other => panic!("expected folder, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_metadata_not_found_is_none() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/get_metadata")
        .respond_with(common::api_error("path/not_found/.."))
        .mount(&server)
        .await;

    let entry = files::get_metadata(&client, &rpath("/missing")).await.unwrap();
    assert!(entry.is_none());
}

#[tokio::test]
async fn test_get_metadata_other_conflict_is_error() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/get_metadata")
        .respond_with(common::api_error("path/malformed_path/.."))
        .mount(&server)
        .await;

    let err = files::get_metadata(&client, &rpath("/bad"))
        .await
        .unwrap_err();
    match err {
        DropboxError::Api { status, summary } => {
            assert_eq!(status, 409);
            assert_eq!(summary, "path/malformed_path/..");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_metadata_nested_not_found_tag_is_error() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/get_metadata")
        .respond_with(common::api_error("from_lookup/not_found/.."))
        .mount(&server)
        .await;

    let err = files::get_metadata(&client, &rpath("/odd"))
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    match err {
        DropboxError::Api { status, summary } => {
            assert_eq!(status, 409);
            assert_eq!(summary, "from_lookup/not_found/..");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// ============================================================================
// download
// ============================================================================

#[tokio::test]
async fn test_download_sends_arg_header_and_returns_body() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::content("files/download")
        .and(header("Dropbox-API-Arg", r#"{"path":"/Sub/b.txt"}"#))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Dropbox-API-Result", file_json("/Sub/b.txt", 5).to_string())
                .set_body_bytes(b"hello".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data = files::download(&client, &rpath("/Sub/b.txt")).await.unwrap();
    assert_eq!(data, b"hello");
}

#[tokio::test]
async fn test_download_missing_file_is_not_found() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::content("files/download")
        .respond_with(common::api_error("path/not_found/."))
        .mount(&server)
        .await;

    let err = files::download(&client, &rpath("/gone.txt")).await.unwrap_err();
    assert!(err.is_not_found());
}

// ============================================================================
// upload
// ============================================================================

#[tokio::test]
async fn test_upload_uses_add_mode_and_octet_stream() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::content("files/upload")
        .and(header(
            "Dropbox-API-Arg",
            r#"{"path":"/only_local.txt","mode":"add","autorename":false,"mute":true}"#,
        ))
        .and(header("Content-Type", "application/octet-stream"))
        .and(body_bytes(b"local bytes".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("/only_local.txt", 11)))
        .expect(1)
        .mount(&server)
        .await;

    files::upload(&client, b"local bytes".to_vec(), &rpath("/only_local.txt"))
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_upload_conflict_is_error() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::content("files/upload")
        .respond_with(common::api_error("path/conflict/file/.."))
        .mount(&server)
        .await;

    let err = files::upload(&client, b"x".to_vec(), &rpath("/taken.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, DropboxError::Api { status: 409, .. }));
}

#[tokio::test]
async fn test_upload_escapes_non_ascii_path() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::content("files/upload")
        .and(header(
            "Dropbox-API-Arg",
            r#"{"path":"/r\u00e9sum\u00e9.pdf","mode":"add","autorename":false,"mute":true}"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("/résumé.pdf", 3)))
        .expect(1)
        .mount(&server)
        .await;

    files::upload(&client, b"pdf".to_vec(), &rpath("/résumé.pdf"))
        .await
        .unwrap();
}

// ============================================================================
// create_folder
// ============================================================================

#[tokio::test]
async fn test_create_folder_sends_path() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/create_folder_v2")
        .and(body_json(json!({ "path": "/New Folder", "autorename": false })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "metadata": folder_json("/New Folder") })),
        )
        .expect(1)
        .mount(&server)
        .await;

    files::create_folder(&client, &rpath("/New Folder"))
        .await
        .unwrap();
}

// ============================================================================
// DropboxRemoteStore
// ============================================================================

#[tokio::test]
async fn test_store_errors_carry_path_context() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::content("files/download")
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = DropboxRemoteStore::new(client);
    let err = store.download(&rpath("/a.txt")).await.unwrap_err();

    assert!(err.to_string().contains("Failed to download /a.txt"));
    assert!(matches!(
        err.downcast_ref::<DropboxError>(),
        Some(DropboxError::ServerError(_))
    ));
}

#[tokio::test]
async fn test_store_round_trip_through_endpoints() {
    let (server, client) = common::setup_dropbox_mock().await;

    common::rpc("files/get_metadata")
        .respond_with(common::api_error("path/not_found/"))
        .mount(&server)
        .await;
    common::rpc("files/create_folder_v2")
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "metadata": folder_json("/Photos") })),
        )
        .expect(1)
        .mount(&server)
        .await;
    common::content("files/upload")
        .and(body_bytes(b"jpeg".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("/Photos/cat.jpg", 4)))
        .expect(1)
        .mount(&server)
        .await;

    let store = DropboxRemoteStore::new(client);
    assert!(store.get_metadata(&rpath("/Photos")).await.unwrap().is_none());
    store.create_folder(&rpath("/Photos")).await.unwrap();
    store
        .upload(b"jpeg".to_vec(), &rpath("/Photos/cat.jpg"))
        .await
        .unwrap();
}
