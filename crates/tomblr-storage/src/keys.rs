//! Storage key derivation.

use uuid::Uuid;

use tomblr_core::types::UserId;

/// Longest file-name fragment kept in a key.
const MAX_NAME_LEN: usize = 100;

/// Derive a fresh, never-reused key for a blob owned by `user_id`.
///
/// Keys look like `{user_id}/{uuidv7}-{sanitized_name}`. The UUID makes the
/// key unique; the name is kept only so the bucket stays browsable.
pub fn object_key(user_id: UserId, file_name: &str) -> String {
    format!("{user_id}/{}-{}", Uuid::now_v7(), sanitize_file_name(file_name))
}

/// Reduce a client-supplied file name to a safe key fragment.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
