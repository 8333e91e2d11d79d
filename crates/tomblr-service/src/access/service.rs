//! Access code generation, listing and verification.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use tomblr_auth::token::generate_access_code;
use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_database::store::AccessCodeStore;
use tomblr_entity::access_code::{AccessCode, CreateAccessCode};

use crate::context::RequestContext;

/// Codes generated when the caller does not ask for a count.
pub const DEFAULT_GENERATE_COUNT: u32 = 5;
/// Upper bound on codes generated in one call.
pub const MAX_GENERATE_COUNT: u32 = 100;
/// How many codes the admin listing shows.
pub const RECENT_CODES_LIMIT: i64 = 20;

/// Manages invitation codes.
#[derive(Debug, Clone)]
pub struct AccessCodeService {
    codes: Arc<dyn AccessCodeStore>,
}

impl AccessCodeService {
    /// Creates a new access code service.
    pub fn new(codes: Arc<dyn AccessCodeStore>) -> Self {
        Self { codes }
    }

    /// Generate `count` fresh codes (default 5, at most 100). Admin only.
    pub async fn generate(&self, ctx: &RequestContext, count: Option<u32>) -> AppResult<Vec<AccessCode>> {
        ctx.require_admin()?;
        let count = count.unwrap_or(DEFAULT_GENERATE_COUNT);
        if count == 0 || count > MAX_GENERATE_COUNT {
            return Err(AppError::validation(format!(
                "count must be between 1 and {MAX_GENERATE_COUNT}"
            )));
        }

        let mut created = Vec::with_capacity(count as usize);
        // Retry rounds absorb code collisions.
        for _ in 0..8 {
            let wanted = count as usize - created.len();
            if wanted == 0 {
                break;
            }
            let batch: Vec<CreateAccessCode> = (0..wanted)
                .map(|_| CreateAccessCode {
                    code: generate_access_code(),
                    expires_at: None,
                })
                .collect();
            created.extend(self.codes.insert_many(&batch).await?);
        }
        if created.len() < count as usize {
            return Err(AppError::conflict("Could not generate unique access codes"));
        }

        info!(count = created.len(), "Access codes generated");
        Ok(created)
    }

    /// Most recent codes. Admin only.
    pub async fn list_recent(&self, ctx: &RequestContext) -> AppResult<Vec<AccessCode>> {
        ctx.require_admin()?;
        self.codes.list_recent(RECENT_CODES_LIMIT).await
    }

    /// Insert fixed codes, skipping any that exist. Returns the ones added.
    pub async fn seed(&self, codes: &[CreateAccessCode]) -> AppResult<Vec<AccessCode>> {
        let inserted = self.codes.insert_many(codes).await?;
        info!(requested = codes.len(), inserted = inserted.len(), "Access codes seeded");
        Ok(inserted)
    }

    /// Check that `code` can still be redeemed.
    pub async fn verify(&self, code: &str) -> AppResult<AccessCode> {
        let code = code.trim();
        let found = self
            .codes
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Invalid access code."))?;
        if found.is_used {
            return Err(AppError::conflict("This code has already been used."));
        }
        if found.is_expired_at(Utc::now()) {
            return Err(AppError::validation("This code has expired."));
        }
        Ok(found)
    }
}
