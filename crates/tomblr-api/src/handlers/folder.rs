//! Folder handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use tomblr_core::types::FolderId;
use tomblr_entity::folder::{Folder, FolderContents};
use tomblr_service::folder::FolderDeletion;

use crate::dto::request::{CreateFolderRequest, validate};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// `?parentId=` filter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentQuery {
    /// Folder whose children are listed; root when absent.
    pub parent_id: Option<FolderId>,
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Folder>>), ApiError> {
    validate(&req)?;
    let folder = state
        .folder_service
        .create(&auth, &req.name, req.color.as_deref(), req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// GET /api/folders?parentId=...
pub async fn list_children(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ParentQuery>,
) -> Result<Json<ApiResponse<FolderContents>>, ApiError> {
    let contents = state
        .folder_service
        .list_children(&auth, query.parent_id)
        .await?;
    Ok(Json(ApiResponse::ok(contents)))
}

/// DELETE /api/folders/{id}
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
) -> Result<Json<ApiResponse<FolderDeletion>>, ApiError> {
    let deletion = state.folder_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(deletion)))
}
