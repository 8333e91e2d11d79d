//! Account registration and login.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use tomblr_auth::jwt::JwtEncoder;
use tomblr_auth::password::{PasswordHasher, PinValidator};
use tomblr_core::error::{AppError, ErrorKind};
use tomblr_core::result::AppResult;
use tomblr_database::store::{AccessCodeStore, UserStore};
use tomblr_entity::user::{CreateUser, SubscriptionTier, User, UserRole};

use crate::access::AccessCodeService;

/// Registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Invitation code.
    pub access_code: String,
    /// Display name.
    pub name: String,
    /// Company name.
    pub company: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Login email.
    pub email: String,
    /// Six-digit PIN.
    pub pin: String,
    /// PIN confirmation.
    pub confirm_pin: String,
}

/// A signed-in session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginToken {
    /// Bearer token.
    pub access_token: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// The signed-in user.
    pub user: User,
}

/// Creates accounts and signs users in.
#[derive(Debug, Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    codes: Arc<dyn AccessCodeStore>,
    access: AccessCodeService,
    hasher: PasswordHasher,
    encoder: JwtEncoder,
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(
        users: Arc<dyn UserStore>,
        codes: Arc<dyn AccessCodeStore>,
        hasher: PasswordHasher,
        encoder: JwtEncoder,
    ) -> Self {
        Self {
            users,
            access: AccessCodeService::new(codes.clone()),
            codes,
            hasher,
            encoder,
        }
    }

    /// Register a FREE-tier user by redeeming an access code.
    pub async fn register(&self, form: Registration) -> AppResult<User> {
        PinValidator::validate(&form.pin, &form.confirm_pin)?;

        let name = form.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        let email = form.email.trim().to_lowercase();
        if !is_plausible_email(&email) {
            return Err(AppError::validation("A valid email is required"));
        }

        let code = self.access.verify(&form.access_code).await?;

        let password_hash = self.hasher.hash_password(&form.pin)?;
        let user = self
            .users
            .create(&CreateUser {
                name: name.to_string(),
                email,
                company: non_empty(form.company),
                phone_number: non_empty(form.phone_number),
                password_hash,
                role: UserRole::User,
                tier: SubscriptionTier::Free,
            })
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => AppError::conflict("Email or Phone Number already in use."),
                _ => e,
            })?;

        if !self.codes.consume(&code.code, user.id).await? {
            // Lost the race for the code; undo the account.
            if let Err(e) = self.users.delete(user.id).await {
                warn!(user_id = %user.id, error = %e, "Failed to remove user after losing access code race");
            }
            return Err(AppError::conflict("This code has already been used."));
        }

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Exchange email and PIN for an access token.
    pub async fn login(&self, email: &str, pin: &str) -> AppResult<LoginToken> {
        let invalid = || AppError::unauthorized("Invalid email or PIN");

        let user = self
            .users
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(invalid)?;
        if !self.hasher.verify_password(pin, &user.password_hash)? {
            return Err(invalid());
        }

        let (access_token, expires_at) = self.encoder.generate_access_token(user.id, user.role)?;
        info!(user_id = %user.id, "User logged in");
        Ok(LoginToken {
            access_token,
            expires_at,
            user,
        })
    }

    /// Create or reuse an admin account, for the admin CLI.
    pub async fn create_admin(&self, name: &str, email: &str, pin: &str) -> AppResult<User> {
        PinValidator::validate(pin, pin)?;
        let email = email.trim().to_lowercase();
        if let Some(existing) = self.users.find_by_email(&email).await? {
            self.users.update_role(existing.id, UserRole::Admin).await?;
            return Ok(User {
                role: UserRole::Admin,
                ..existing
            });
        }
        let user = self
            .users
            .create(&CreateUser {
                name: name.trim().to_string(),
                email,
                company: None,
                phone_number: None,
                password_hash: self.hasher.hash_password(pin)?,
                role: UserRole::Admin,
                tier: SubscriptionTier::Free,
            })
            .await?;
        info!(user_id = %user.id, "Admin user created");
        Ok(user)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
