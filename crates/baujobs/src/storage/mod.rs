//! CV uploads and pre-signed object store URLs.

pub mod local;
pub mod router;
pub mod s3;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tracing::error;

use crate::error::ApiError;

pub use local::LocalStore;
pub use router::upload_router;
pub use s3::S3Store;

pub const CV_FIELD: &str = "lebenslauf";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("not supported by the configured storage backend")]
    Unsupported,
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("object store error: {0}")]
    Provider(String),
}

impl From<StorageError> for ApiError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Unsupported => ApiError::bad_request(value.to_string()),
            other => {
                error!(error = %other, "storage operation failed");
                ApiError::Internal("file storage failed".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedUpload {
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
    pub key: String,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores a PDF under `name` and returns the URL it is reachable at.
    async fn store_pdf(&self, name: &str, bytes: Vec<u8>) -> Result<String, StorageError>;

    async fn presign_upload(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<PresignedUpload, StorageError>;

    async fn presign_download(&self, key: &str) -> Result<String, StorageError>;
}

/// `lebenslauf-<millis>-<random>.pdf`
pub fn cv_file_name() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{CV_FIELD}-{}-{suffix}.pdf", Utc::now().timestamp_millis())
}

/// Object key for a direct client upload. Path separators and anything
/// outside a conservative character set are replaced.
pub fn upload_key(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned = if cleaned.is_empty() { "datei" } else { cleaned };
    format!("uploads/{}-{cleaned}", Utc::now().timestamp_millis())
}
