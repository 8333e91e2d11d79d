//! Integration tests for public share links.

mod helpers;

use http::StatusCode;

async fn uploaded_file(app: &helpers::TestApp, user: &helpers::TestUser) -> String {
    let response = app.upload(user, "photo.png", b"not really a png").await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    response.data()["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_issue_and_resolve_without_auth() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;
    let id = uploaded_file(&app, &user).await;

    let link = app
        .request("POST", &format!("/api/files/{id}/share"), None, Some(&user.token))
        .await;
    assert_eq!(link.status, StatusCode::OK);
    let token = link.data()["token"].as_str().unwrap().to_string();
    assert!(link.data()["url"].as_str().unwrap().ends_with(&token));

    let shared = app
        .request("GET", &format!("/api/share/{token}"), None, None)
        .await;
    assert_eq!(shared.status, StatusCode::OK, "{:?}", shared.body);
    assert_eq!(shared.data()["name"], "photo.png");
    assert!(shared.data()["downloadUrl"].as_str().is_some());
}

#[tokio::test]
async fn test_reissue_rotates_token() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;
    let id = uploaded_file(&app, &user).await;
    let path = format!("/api/files/{id}/share");

    let first = app.request("POST", &path, None, Some(&user.token)).await;
    let second = app.request("POST", &path, None, Some(&user.token)).await;
    let first = first.data()["token"].as_str().unwrap().to_string();
    let second = second.data()["token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    let old = app
        .request("GET", &format!("/api/share/{first}"), None, None)
        .await;
    assert_eq!(old.status, StatusCode::NOT_FOUND);

    let new = app
        .request("GET", &format!("/api/share/{second}"), None, None)
        .await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn test_revoke_hides_file() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;
    let id = uploaded_file(&app, &user).await;
    let path = format!("/api/files/{id}/share");

    let link = app.request("POST", &path, None, Some(&user.token)).await;
    let token = link.data()["token"].as_str().unwrap().to_string();

    let revoked = app.request("DELETE", &path, None, Some(&user.token)).await;
    assert_eq!(revoked.status, StatusCode::OK);

    let resolved = app
        .request("GET", &format!("/api/share/{token}"), None, None)
        .await;
    assert_eq!(resolved.status, StatusCode::NOT_FOUND);
    assert_eq!(resolved.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_only_owner_can_share() {
    let app = helpers::TestApp::new().await;
    let owner = app.register_user("ada@example.com").await;
    let other = app.register_user("bob@example.com").await;
    let id = uploaded_file(&app, &owner).await;

    let response = app
        .request(
            "POST",
            &format!("/api/files/{id}/share"),
            None,
            Some(&other.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_token() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("GET", "/api/share/does-not-exist", None, None)
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
