//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use tomblr_api::{AppState, Backends};
use tomblr_core::config::AppConfig;
use tomblr_core::types::UserId;
use tomblr_database::MemoryStore;
use tomblr_entity::access_code::CreateAccessCode;
use tomblr_storage::{ChunkStaging, MemoryObjectStore};

/// PIN every test account signs in with
pub const TEST_PIN: &str = "246810";

const BOUNDARY: &str = "tomblr-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching services directly
    pub state: AppState,
    /// Metadata backend
    pub metadata: Arc<MemoryStore>,
    /// Blob backend
    pub objects: Arc<MemoryObjectStore>,
    _staging_dir: TempDir,
}

/// A signed-in account
#[derive(Debug, Clone)]
pub struct TestUser {
    /// User id
    pub id: UserId,
    /// Bearer token
    pub token: String,
}

impl TestApp {
    /// Create a new test application on in-memory backends
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret".into();

        let staging_dir = tempfile::tempdir().expect("Failed to create staging dir");
        let metadata = Arc::new(MemoryStore::new());
        let objects = Arc::new(MemoryObjectStore::default());

        let backends = Backends {
            users: metadata.clone(),
            files: metadata.clone(),
            folders: metadata.clone(),
            codes: metadata.clone(),
            objects: objects.clone(),
            staging: ChunkStaging::new(staging_dir.path()),
        };
        let state = AppState::build(config, backends);
        let router = tomblr_api::build_router(state.clone());

        Self {
            router,
            state,
            metadata,
            objects,
            _staging_dir: staging_dir,
        }
    }

    /// Insert an unused access code
    pub async fn seed_code(&self, code: &str) {
        self.state
            .access_service
            .seed(&[CreateAccessCode {
                code: code.to_string(),
                expires_at: None,
            }])
            .await
            .expect("Failed to seed access code");
    }

    /// Register through the API and sign in
    pub async fn register_user(&self, email: &str) -> TestUser {
        let code = format!("CODE-{}", email.replace(['@', '.'], "-"));
        self.seed_code(&code).await;

        let response = self
            .request(
                "POST",
                "/api/auth/register",
                Some(json!({
                    "accessCode": code,
                    "name": "Test User",
                    "email": email,
                    "pin": TEST_PIN,
                    "confirmPin": TEST_PIN,
                })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Register failed: {:?}",
            response.body
        );

        self.login(email).await
    }

    /// Create an admin account and sign in
    pub async fn create_admin(&self, email: &str) -> TestUser {
        self.state
            .account_service
            .create_admin("Admin", email, TEST_PIN)
            .await
            .expect("Failed to create admin");
        self.login(email).await
    }

    /// Login and return the user id and JWT access token
    pub async fn login(&self, email: &str) -> TestUser {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(json!({ "email": email, "pin": TEST_PIN })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );

        let token = response.data()["accessToken"]
            .as_str()
            .expect("No accessToken in login response")
            .to_string();
        let id = serde_json::from_value(response.data()["user"]["id"].clone())
            .expect("No user id in login response");

        TestUser { id, token }
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Make a multipart request to the test app
    pub async fn multipart(&self, path: &str, form: Multipart, token: &str) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::from(form.finish()))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Upload `data` in one request
    pub async fn upload(&self, user: &TestUser, name: &str, data: &[u8]) -> TestResponse {
        let form = Multipart::new().file("file", name, "application/octet-stream", data);
        self.multipart("/api/files/upload", form, &user.token).await
    }

    /// Upload `data` into a folder in one request
    pub async fn upload_into(
        &self,
        user: &TestUser,
        folder_id: &str,
        name: &str,
        data: &[u8],
    ) -> TestResponse {
        let form = Multipart::new()
            .text("folderId", folder_id)
            .file("file", name, "application/octet-stream", data);
        self.multipart("/api/files/upload", form, &user.token).await
    }

    /// Send one chunk of a resumable upload
    pub async fn send_chunk(
        &self,
        user: &TestUser,
        upload_id: &str,
        index: u32,
        total: u32,
        declared_size: usize,
        data: &[u8],
    ) -> TestResponse {
        let form = Multipart::new()
            .text("uploadId", upload_id)
            .text("chunkIndex", &index.to_string())
            .text("totalChunks", &total.to_string())
            .text("fileName", "movie.bin")
            .text("fileType", "application/octet-stream")
            .text("fileSize", &declared_size.to_string())
            .file("chunk", "blob", "application/octet-stream", data);
        self.multipart("/api/files/chunk", form, &user.token).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `error` code of a failure body
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// Minimal multipart/form-data body builder
#[derive(Debug, Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    /// Empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}
