//! Integration tests for single-shot and chunked uploads.

mod helpers;

use http::StatusCode;
use serde_json::json;

use tomblr_core::traits::ObjectStore;
use tomblr_core::types::FileId;
use tomblr_database::FileStore;

const MIB: usize = 1024 * 1024;

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

#[tokio::test]
async fn test_upload_requires_authentication() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/files", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_simple_upload_and_list() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    let response = app.upload(&user, "notes.txt", b"hello tomblr").await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.data()["name"], "notes.txt");
    assert_eq!(response.data()["size"], 12);
    assert!(response.data().get("storageKey").is_none());

    let listed = app.request("GET", "/api/files", None, Some(&user.token)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.data().as_array().map(Vec::len), Some(1));

    let usage = app
        .request("GET", "/api/files/usage", None, Some(&user.token))
        .await;
    assert_eq!(usage.data()["used"], 12);
    assert_eq!(usage.data()["tier"], "FREE");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    let form = helpers::Multipart::new().text("folderId", "");
    let response = app.multipart("/api/files/upload", form, &user.token).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "No file provided");
}

#[tokio::test]
async fn test_claimed_user_must_match_token() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;
    let other = app.register_user("bob@example.com").await;

    let form = helpers::Multipart::new()
        .text("userId", &other.id.to_string())
        .file("file", "a.txt", "text/plain", b"abc");
    let response = app.multipart("/api/files/upload", form, &user.token).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let path = format!("/api/files?userId={}", other.id);
    let response = app.request("GET", &path, None, Some(&user.token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let path = format!("/api/files?userId={}", user.id);
    let response = app.request("GET", &path, None, Some(&user.token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_chunks_out_of_order_assemble_in_index_order() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    let chunks: Vec<Vec<u8>> = (0..3).map(|i| pattern(4 * MIB, i as u8)).collect();
    let expected: Vec<u8> = chunks.concat();

    for index in [1u32, 0, 2] {
        let response = app
            .send_chunk(&user, "upload-a", index, 3, 12 * MIB, &chunks[index as usize])
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        assert_eq!(response.data()["chunkIndex"], index);
    }

    let response = app
        .request(
            "POST",
            "/api/files/chunk/finalize",
            Some(json!({ "uploadId": "upload-a" })),
            Some(&user.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.data()["file"]["size"], 12 * MIB);

    let file_id: FileId = serde_json::from_value(response.data()["fileId"].clone()).unwrap();
    let file = app
        .metadata
        .find_owned(file_id, user.id)
        .await
        .unwrap()
        .expect("file row");
    let blob = app.objects.get(&file.storage_key).await.expect("blob");
    assert_eq!(blob.len(), 12 * MIB);
    assert!(blob[..] == expected[..]);
}

#[tokio::test]
async fn test_quota_exceeded_leaves_usage_unchanged() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;
    app.metadata
        .set_storage(user.id, 9 * MIB as i64, 10 * MIB as i64)
        .await
        .unwrap();

    let response = app.upload(&user, "big.bin", &pattern(2 * MIB, 7)).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.error_code(), "QUOTA_EXCEEDED");
    assert!(app.objects.is_empty().await);

    let listed = app.request("GET", "/api/files", None, Some(&user.token)).await;
    assert_eq!(listed.data().as_array().map(Vec::len), Some(0));
    let usage = app
        .request("GET", "/api/files/usage", None, Some(&user.token))
        .await;
    assert_eq!(usage.data()["used"], 9 * MIB);
}

#[tokio::test]
async fn test_finalize_with_missing_chunk_is_incomplete() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    for index in [0u32, 1, 3] {
        app.send_chunk(&user, "upload-d", index, 4, 4 * 1024, &pattern(1024, 1))
            .await;
    }

    let response = app
        .request(
            "POST",
            "/api/files/chunk/finalize",
            Some(json!({ "uploadId": "upload-d" })),
            Some(&user.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "INCOMPLETE_UPLOAD");
    let listed = app.request("GET", "/api/files", None, Some(&user.token)).await;
    assert_eq!(listed.data().as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_concurrent_finalize_creates_one_file() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    for index in 0..2u32 {
        app.send_chunk(&user, "upload-p2", index, 2, 2048, &pattern(1024, index as u8))
            .await;
    }

    let body = json!({ "uploadId": "upload-p2" });
    let (first, second) = tokio::join!(
        app.request(
            "POST",
            "/api/files/chunk/finalize",
            Some(body.clone()),
            Some(&user.token)
        ),
        app.request(
            "POST",
            "/api/files/chunk/finalize",
            Some(body.clone()),
            Some(&user.token)
        ),
    );

    let successes = [&first, &second]
        .iter()
        .filter(|r| r.status == StatusCode::OK)
        .count();
    assert_eq!(successes, 1, "{:?} / {:?}", first.body, second.body);

    let listed = app.request("GET", "/api/files", None, Some(&user.token)).await;
    assert_eq!(listed.data().as_array().map(Vec::len), Some(1));
    let usage = app
        .request("GET", "/api/files/usage", None, Some(&user.token))
        .await;
    assert_eq!(usage.data()["used"], 2048);
}

#[tokio::test]
async fn test_failed_metadata_write_leaves_no_blob() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;
    app.metadata.fail_file_creates(true);

    let response = app.upload(&user, "doomed.bin", b"payload").await;

    assert!(response.status.is_server_error(), "{:?}", response.body);
    assert!(app.objects.is_empty().await);
    let usage = app
        .request("GET", "/api/files/usage", None, Some(&user.token))
        .await;
    assert_eq!(usage.data()["used"], 0);
}

#[tokio::test]
async fn test_download_url_and_delete_release_quota() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    let uploaded = app.upload(&user, "photo.png", &pattern(4096, 3)).await;
    let id = uploaded.data()["id"].as_str().unwrap().to_string();

    let download = app
        .request("GET", &format!("/api/files/{id}"), None, Some(&user.token))
        .await;
    assert_eq!(download.status, StatusCode::OK);
    assert!(download.data()["url"].as_str().is_some_and(|u| !u.is_empty()));

    let deleted = app
        .request("DELETE", &format!("/api/files/{id}"), None, Some(&user.token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert!(app.objects.is_empty().await);

    let usage = app
        .request("GET", "/api/files/usage", None, Some(&user.token))
        .await;
    assert_eq!(usage.data()["used"], 0);

    let missing = app
        .request("GET", &format!("/api/files/{id}"), None, Some(&user.token))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_presigned_upload_is_charged_on_completion() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    let issued = app
        .request(
            "POST",
            "/api/files/presign",
            Some(json!({ "fileName": "clip.mp4", "fileSize": 2048 })),
            Some(&user.token),
        )
        .await;
    assert_eq!(issued.status, StatusCode::OK);
    let key = issued.data()["key"].as_str().unwrap().to_string();
    assert!(key.starts_with(&format!("{}/", user.id)));

    let early = app
        .request(
            "POST",
            "/api/files/presign/complete",
            Some(json!({ "key": key })),
            Some(&user.token),
        )
        .await;
    assert_eq!(early.status, StatusCode::CONFLICT);
    assert_eq!(early.error_code(), "INCOMPLETE_UPLOAD");

    // The client writes straight to the bucket.
    app.objects
        .put(&key, pattern(2048, 9).into(), "video/mp4")
        .await
        .unwrap();

    let completed = app
        .request(
            "POST",
            "/api/files/presign/complete",
            Some(json!({ "key": key })),
            Some(&user.token),
        )
        .await;
    assert_eq!(completed.status, StatusCode::OK, "{:?}", completed.body);
    assert_eq!(completed.data()["name"], "clip.mp4");
    assert_eq!(completed.data()["size"], 2048);

    let usage = app
        .request("GET", "/api/files/usage", None, Some(&user.token))
        .await;
    assert_eq!(usage.data()["used"], 2048);
}

#[tokio::test]
async fn test_presigned_key_of_another_user_is_not_found() {
    let app = helpers::TestApp::new().await;
    let owner = app.register_user("ada@example.com").await;
    let intruder = app.register_user("eve@example.com").await;

    let issued = app
        .request(
            "POST",
            "/api/files/presign",
            Some(json!({ "fileName": "private.pdf" })),
            Some(&owner.token),
        )
        .await;
    let key = issued.data()["key"].as_str().unwrap().to_string();
    app.objects
        .put(&key, b"secret".to_vec().into(), "application/pdf")
        .await
        .unwrap();

    let stolen = app
        .request(
            "POST",
            "/api/files/presign/complete",
            Some(json!({ "key": key })),
            Some(&intruder.token),
        )
        .await;
    assert_eq!(stolen.status, StatusCode::NOT_FOUND);

    let usage = app
        .request("GET", "/api/files/usage", None, Some(&intruder.token))
        .await;
    assert_eq!(usage.data()["used"], 0);
}
