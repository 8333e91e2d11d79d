//! Object store and chunk staging configuration.

use serde::{Deserialize, Serialize};

/// S3-compatible object store configuration (MinIO in development).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Endpoint URL, e.g. `http://localhost:9000`. Empty uses the AWS default.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Region name.
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket holding every blob.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Access key ID.
    #[serde(default = "default_access_key")]
    pub access_key: String,
    /// Secret access key.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    /// Use path-style addressing (required by MinIO).
    #[serde(default = "default_true")]
    pub force_path_style: bool,
    /// Directory where in-flight chunks are staged.
    #[serde(default = "default_staging_root")]
    pub staging_root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            region: default_region(),
            bucket: default_bucket(),
            access_key: default_access_key(),
            secret_key: default_secret_key(),
            force_path_style: true,
            staging_root: default_staging_root(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket() -> String {
    "tomblr".to_string()
}

fn default_access_key() -> String {
    "minioadmin".to_string()
}

fn default_secret_key() -> String {
    "minioadmin".to_string()
}

fn default_true() -> bool {
    true
}

fn default_staging_root() -> String {
    "./data/staging".to_string()
}
