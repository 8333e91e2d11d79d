//! Access code, registration and login handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use tomblr_entity::user::User;
use tomblr_service::account::{LoginToken, Registration};

use crate::dto::request::{LoginRequest, RegisterRequest, VerifyCodeRequest, validate};
use crate::dto::response::{ApiResponse, VerifyCodeResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/auth/verify-code
pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<ApiResponse<VerifyCodeResponse>>, ApiError> {
    validate(&req)?;
    state.access_service.verify(&req.code).await?;
    Ok(Json(ApiResponse::ok(VerifyCodeResponse { valid: true })))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    validate(&req)?;
    let user = state
        .account_service
        .register(Registration {
            access_code: req.access_code,
            name: req.name,
            company: req.company,
            phone_number: req.phone_number,
            email: req.email,
            pin: req.pin,
            confirm_pin: req.confirm_pin,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginToken>>, ApiError> {
    validate(&req)?;
    let token = state.account_service.login(&req.email, &req.pin).await?;
    Ok(Json(ApiResponse::ok(token)))
}
