//! Client-chosen upload identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use tomblr_core::AppError;

/// Longest accepted upload identifier.
pub const MAX_UPLOAD_ID_LEN: usize = 128;

/// Identifier grouping the chunks of one upload.
///
/// Clients generate these (e.g. `1718030000000-k3j9x2a1b`), so the value
/// is restricted to ASCII alphanumerics, `-` and `_` before it is used as
/// a staging directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UploadId(String);

impl UploadId {
    /// Validate and wrap a raw identifier.
    pub fn parse(raw: impl Into<String>) -> Result<Self, AppError> {
        let raw = raw.into();
        if raw.is_empty() || raw.len() > MAX_UPLOAD_ID_LEN {
            return Err(AppError::validation(format!(
                "uploadId must be 1 to {MAX_UPLOAD_ID_LEN} characters"
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::validation(
                "uploadId may only contain letters, digits, '-' and '_'",
            ));
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UploadId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<UploadId> for String {
    fn from(id: UploadId) -> String {
        id.0
    }
}
