//! Route definitions for the Tomblr HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors = middleware::cors::build_cors_layer(&server.cors);
    let body_limit = server.body_limit_bytes;
    let timeout = Duration::from_secs(server.request_timeout_seconds);

    let api_routes = Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(file_routes())
        .merge(folder_routes())
        .merge(share_routes())
        .merge(admin_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Access codes, registration, login
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/verify-code", post(handlers::auth::verify_code))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
}

/// Uploads, downloads, listing, ordering, sharing
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files", get(handlers::file::list_files))
        .route("/files/upload", post(handlers::file::upload_file))
        .route("/files/chunk", post(handlers::file::upload_chunk))
        .route(
            "/files/chunk/finalize",
            post(handlers::file::finalize_upload),
        )
        .route("/files/presign", post(handlers::file::presign_upload))
        .route(
            "/files/presign/complete",
            post(handlers::file::complete_presigned),
        )
        .route("/files/usage", get(handlers::file::usage))
        .route("/files/positions", patch(handlers::file::update_positions))
        .route(
            "/files/{id}",
            get(handlers::file::get_file).delete(handlers::file::delete_file),
        )
        .route(
            "/files/{id}/share",
            post(handlers::share::issue_share).delete(handlers::share::revoke_share),
        )
}

/// Folder tree
fn folder_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/folders",
            get(handlers::folder::list_children).post(handlers::folder::create_folder),
        )
        .route(
            "/folders/{id}",
            axum::routing::delete(handlers::folder::delete_folder),
        )
}

/// Public share resolution
fn share_routes() -> Router<AppState> {
    Router::new().route("/share/{token}", get(handlers::share::resolve_share))
}

/// Admin dashboard
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(handlers::admin::stats))
        .route("/admin/users", get(handlers::admin::list_users))
        .route("/admin/users/{id}/role", patch(handlers::admin::update_role))
        .route("/admin/users/{id}/tier", patch(handlers::admin::update_tier))
        .route(
            "/admin/access-codes",
            get(handlers::admin::list_codes).post(handlers::admin::generate_codes),
        )
}
