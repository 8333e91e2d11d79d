//! Integration tests for the admin dashboard.

mod helpers;

use http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = helpers::TestApp::new().await;
    let user = app.register_user("ada@example.com").await;

    for path in ["/api/admin/stats", "/api/admin/users", "/api/admin/access-codes"] {
        let response = app.request("GET", path, None, Some(&user.token)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{path}");
    }
}

#[tokio::test]
async fn test_stats_and_user_list() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_admin("admin@example.com").await;
    let user = app.register_user("ada@example.com").await;
    app.upload(&user, "a.bin", &[1u8; 300]).await;

    let stats = app
        .request("GET", "/api/admin/stats", None, Some(&admin.token))
        .await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.data()["totalUsers"], 2);
    assert_eq!(stats.data()["totalFiles"], 1);
    assert_eq!(stats.data()["totalStorageUsed"], 300);

    let users = app
        .request("GET", "/api/admin/users", None, Some(&admin.token))
        .await;
    let rows = users.data().as_array().unwrap();
    let ada = rows
        .iter()
        .find(|u| u["email"] == "ada@example.com")
        .unwrap();
    assert_eq!(ada["fileCount"], 1);
    assert_eq!(ada["storageUsed"], 300);
}

#[tokio::test]
async fn test_update_tier_changes_limit() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_admin("admin@example.com").await;
    let user = app.register_user("ada@example.com").await;

    let response = app
        .request(
            "PATCH",
            &format!("/api/admin/users/{}/tier", user.id),
            Some(json!({ "tier": "PRO" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    let usage = app
        .request("GET", "/api/files/usage", None, Some(&user.token))
        .await;
    assert_eq!(usage.data()["tier"], "PRO");
    assert_eq!(usage.data()["limit"], 536_870_912_000i64);
}

#[tokio::test]
async fn test_update_role() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_admin("admin@example.com").await;
    let user = app.register_user("ada@example.com").await;

    let response = app
        .request(
            "PATCH",
            &format!("/api/admin/users/{}/role", user.id),
            Some(json!({ "role": "ADMIN" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let promoted = app.login("ada@example.com").await;
    let stats = app
        .request("GET", "/api/admin/stats", None, Some(&promoted.token))
        .await;
    assert_eq!(stats.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_unknown_user() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_admin("admin@example.com").await;

    let response = app
        .request(
            "PATCH",
            "/api/admin/users/00000000-0000-0000-0000-000000000001/tier",
            Some(json!({ "tier": "BUSINESS" })),
            Some(&admin.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_and_list_codes() {
    let app = helpers::TestApp::new().await;
    let admin = app.create_admin("admin@example.com").await;

    let generated = app
        .request(
            "POST",
            "/api/admin/access-codes",
            Some(json!({ "count": 3 })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(generated.status, StatusCode::CREATED, "{:?}", generated.body);
    let codes = generated.data().as_array().unwrap();
    assert_eq!(codes.len(), 3);
    let code = codes[0]["code"].as_str().unwrap().to_string();

    let listed = app
        .request("GET", "/api/admin/access-codes", None, Some(&admin.token))
        .await;
    assert_eq!(listed.data().as_array().map(Vec::len), Some(3));

    let verified = app
        .request(
            "POST",
            "/api/auth/verify-code",
            Some(json!({ "code": code })),
            None,
        )
        .await;
    assert_eq!(verified.status, StatusCode::OK);

    let too_many = app
        .request(
            "POST",
            "/api/admin/access-codes",
            Some(json!({ "count": 500 })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(too_many.status, StatusCode::BAD_REQUEST);
}
