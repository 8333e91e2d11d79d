//! Admin dashboard handlers. Role checks happen in the services.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use tomblr_core::types::UserId;
use tomblr_entity::access_code::AccessCode;
use tomblr_entity::user::UserSummary;
use tomblr_service::admin::SystemStats;

use crate::dto::request::{GenerateCodesRequest, UpdateRoleRequest, UpdateTierRequest};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<SystemStats>>, ApiError> {
    let stats = state.admin_service.stats(&auth).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, ApiError> {
    let users = state.admin_service.list_users(&auth).await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// PATCH /api/admin/users/{id}/role
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<UserId>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .admin_service
        .update_user_role(&auth, id, req.role)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: format!("Role set to {}", req.role),
    })))
}

/// PATCH /api/admin/users/{id}/tier
pub async fn update_tier(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<UserId>,
    Json(req): Json<UpdateTierRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .admin_service
        .update_user_tier(&auth, id, req.tier)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: format!("Tier set to {}", req.tier),
    })))
}

/// GET /api/admin/access-codes
pub async fn list_codes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<AccessCode>>>, ApiError> {
    let codes = state.access_service.list_recent(&auth).await?;
    Ok(Json(ApiResponse::ok(codes)))
}

/// POST /api/admin/access-codes
pub async fn generate_codes(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Option<Json<GenerateCodesRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<AccessCode>>>), ApiError> {
    let count = body.and_then(|Json(req)| req.count);
    let codes = state.access_service.generate(&auth, count).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(codes))))
}
