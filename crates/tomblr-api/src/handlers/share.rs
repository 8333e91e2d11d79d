//! Share link handlers.

use axum::Json;
use axum::extract::{Path, State};

use tomblr_core::types::FileId;
use tomblr_entity::file::SharedFile;
use tomblr_service::share::ShareLink;

use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/files/{id}/share
pub async fn issue_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> Result<Json<ApiResponse<ShareLink>>, ApiError> {
    let link = state.share_service.issue(&auth, id).await?;
    Ok(Json(ApiResponse::ok(link)))
}

/// DELETE /api/files/{id}/share
pub async fn revoke_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.share_service.revoke(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Share link revoked".to_string(),
    })))
}

/// GET /api/share/{token} (public)
pub async fn resolve_share(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<SharedFile>>, ApiError> {
    let shared = state.share_service.resolve(&token).await?;
    Ok(Json(ApiResponse::ok(shared)))
}
