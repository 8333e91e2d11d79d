//! `AuthUser` extractor: validates the bearer JWT and injects the request context.

use axum::RequestPartsExt;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use serde::Deserialize;

use tomblr_service::context::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

#[derive(Debug, Deserialize)]
struct ClaimedUser {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }

    /// Reject a request whose explicit `userId` names someone else.
    pub fn check_claimed(&self, claimed: Option<&str>) -> Result<(), ApiError> {
        match claimed.map(str::trim).filter(|c| !c.is_empty()) {
            None => Ok(()),
            Some(raw) if raw == self.0.user_id.to_string() => Ok(()),
            Some(_) => Err(ApiError::unauthorized(
                "userId does not match the authenticated user",
            )),
        }
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::unauthorized("Missing or invalid Authorization header"))?;

        let claims = state.jwt_decoder.decode_access_token(bearer.token())?;
        let auth = AuthUser(RequestContext::new(claims.user_id(), claims.role));

        let claimed = Query::<ClaimedUser>::try_from_uri(&parts.uri)
            .map(|Query(q)| q.user_id)
            .unwrap_or_default();
        auth.check_claimed(claimed.as_deref())?;

        Ok(auth)
    }
}
