//! Integration tests for the folder tree.

mod helpers;

use http::StatusCode;
use serde_json::json;

async fn create_folder(
    app: &helpers::TestApp,
    user: &helpers::TestUser,
    name: &str,
    parent: Option<&str>,
) -> String {
    let response = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": name, "parentId": parent })),
            Some(&user.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.data()["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_folder_defaults_color() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    let response = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": "Photos" })),
            Some(&user.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["name"], "Photos");
    assert_eq!(response.data()["color"], "#6D28D9");
    assert!(response.data()["parentId"].is_null());
}

#[tokio::test]
async fn test_create_folder_rejects_bad_color() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    let response = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": "Photos", "color": "purple" })),
            Some(&user.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_children_of_folder() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    let parent = create_folder(&app, &user, "A", None).await;
    create_folder(&app, &user, "B", Some(&parent)).await;
    let uploaded = app.upload_into(&user, &parent, "f.txt", b"data").await;
    assert_eq!(uploaded.status, StatusCode::OK, "{:?}", uploaded.body);

    let root = app.request("GET", "/api/folders", None, Some(&user.token)).await;
    assert_eq!(root.data()["folders"].as_array().map(Vec::len), Some(1));
    assert_eq!(root.data()["files"].as_array().map(Vec::len), Some(0));

    let path = format!("/api/folders?parentId={parent}");
    let inside = app.request("GET", &path, None, Some(&user.token)).await;
    assert_eq!(inside.status, StatusCode::OK);
    assert_eq!(inside.data()["folders"][0]["name"], "B");
    assert_eq!(inside.data()["files"][0]["name"], "f.txt");
}

#[tokio::test]
async fn test_delete_folder_cascades_to_blobs() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    let a = create_folder(&app, &user, "A", None).await;
    let b = create_folder(&app, &user, "B", Some(&a)).await;
    let uploaded = app.upload_into(&user, &b, "deep.bin", &[9u8; 2048]).await;
    assert_eq!(uploaded.status, StatusCode::OK);
    assert_eq!(app.objects.len().await, 1);

    let response = app
        .request("DELETE", &format!("/api/folders/{a}"), None, Some(&user.token))
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.data()["foldersRemoved"], 2);
    assert_eq!(response.data()["filesRemoved"], 1);
    assert_eq!(response.data()["bytesReleased"], 2048);
    assert!(app.objects.is_empty().await);

    let root = app.request("GET", "/api/folders", None, Some(&user.token)).await;
    assert_eq!(root.data()["folders"].as_array().map(Vec::len), Some(0));
    let path = format!("/api/folders?parentId={b}");
    let gone = app.request("GET", &path, None, Some(&user.token)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let usage = app
        .request("GET", "/api/files/usage", None, Some(&user.token))
        .await;
    assert_eq!(usage.data()["used"], 0);
}

#[tokio::test]
async fn test_folders_are_private_to_owner() {
    let app = helpers::TestApp::new().await;
    let owner = app.register_user("ada@example.com").await;
    let intruder = app.register_user("bob@example.com").await;

    let folder = create_folder(&app, &owner, "Private", None).await;

    let response = app
        .request(
            "DELETE",
            &format!("/api/folders/{folder}"),
            None,
            Some(&intruder.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .upload_into(&intruder, &folder, "x.txt", b"x")
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reorder_files_and_folders() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    let folder = create_folder(&app, &user, "A", None).await;
    let first = app.upload(&user, "1.txt", b"1").await;
    let second = app.upload(&user, "2.txt", b"2").await;
    let first_id = first.data()["id"].as_str().unwrap().to_string();
    let second_id = second.data()["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "PATCH",
            "/api/files/positions",
            Some(json!({ "items": [
                { "id": second_id, "type": "file", "order": 0 },
                { "id": first_id, "type": "file", "order": 1 },
                { "id": folder, "type": "folder", "order": 5 },
            ]})),
            Some(&user.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.data()["count"], 3);

    let listed = app.request("GET", "/api/files", None, Some(&user.token)).await;
    assert_eq!(listed.data()[0]["name"], "2.txt");
    assert_eq!(listed.data()[1]["name"], "1.txt");
}
