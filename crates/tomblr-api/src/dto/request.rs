//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use tomblr_core::types::FolderId;
use tomblr_entity::file::PositionUpdate;
use tomblr_entity::user::{SubscriptionTier, UserRole};

use crate::error::ApiError;

/// Run `validator` rules and map failures to a 400.
pub fn validate<T: Validate>(request: &T) -> Result<(), ApiError> {
    request.validate().map_err(|errors| {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        ApiError::validation(message)
    })
}

/// Access code check before registration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    /// The code to check.
    #[validate(length(min = 1, message = "Access code is required"))]
    pub code: String,
}

/// Registration form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Invitation code.
    #[validate(length(min = 1, message = "Access code is required"))]
    pub access_code: String,
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Company.
    pub company: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Login email.
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Six-digit PIN.
    pub pin: String,
    /// PIN confirmation.
    pub confirm_pin: String,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login email.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// PIN.
    #[validate(length(min = 1, message = "PIN is required"))]
    pub pin: String,
}

/// Finalize a chunked upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeUploadRequest {
    /// Upload to finalize.
    pub upload_id: String,
    /// Optional principal assertion.
    pub user_id: Option<String>,
}

/// Ask for a presigned direct-upload URL.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadRequest {
    /// Name of the file about to be uploaded.
    #[validate(length(min = 1, max = 255, message = "fileName is required"))]
    pub file_name: String,
    /// Size about to be written, checked against the remaining quota.
    pub file_size: Option<u64>,
    /// Destination folder; root when absent.
    pub folder_id: Option<FolderId>,
}

/// Confirm that a presigned upload has been written.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteDirectUploadRequest {
    /// Key returned by the presign call.
    #[validate(length(min = 1, message = "key is required"))]
    pub key: String,
    /// MIME type; the stored object's type when absent.
    pub file_type: Option<String>,
}

/// `?folderId=` filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderQuery {
    /// Folder to list; root when absent.
    pub folder_id: Option<FolderId>,
}

/// Batch reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePositionsRequest {
    /// New positions.
    pub items: Vec<PositionUpdate>,
}

/// Create folder request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = 255, message = "Folder name must be 1-255 characters"))]
    pub name: String,
    /// `#RGB` or `#RRGGBB`.
    pub color: Option<String>,
    /// Parent folder; root when absent.
    pub parent_id: Option<FolderId>,
}

/// Change a user's role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    /// New role.
    pub role: UserRole,
}

/// Change a user's tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTierRequest {
    /// New tier.
    pub tier: SubscriptionTier,
}

/// Generate access codes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateCodesRequest {
    /// How many; defaults to 5.
    pub count: Option<u32>,
}
