//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use tomblr_core::config::AuthConfig;
use tomblr_core::error::AppError;

use super::claims::Claims;

/// Validates JWT access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::unauthorized("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::unauthorized("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::unauthorized("Invalid token signature")
                    }
                    _ => AppError::unauthorized(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;
    use tomblr_core::error::ErrorKind;
    use tomblr_core::types::UserId;
    use tomblr_entity::user::UserRole;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            jwt_access_ttl_minutes: 60,
        }
    }

    #[test]
    fn test_roundtrip_preserves_principal() {
        let cfg = config("test-secret");
        let user_id = UserId::new();
        let (token, exp) = JwtEncoder::new(&cfg)
            .generate_access_token(user_id, UserRole::Admin)
            .unwrap();

        let claims = JwtDecoder::new(&cfg).decode_access_token(&token).unwrap();
        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp, exp.timestamp());
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let (token, _) = JwtEncoder::new(&config("one"))
            .generate_access_token(UserId::new(), UserRole::User)
            .unwrap();

        let err = JwtDecoder::new(&config("two"))
            .decode_access_token(&token)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[test]
    fn test_garbage_is_unauthorized() {
        let err = JwtDecoder::new(&config("s"))
            .decode_access_token("not-a-jwt")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }
}
