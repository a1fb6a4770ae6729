use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use super::{FileStore, PresignedUpload, StorageError};

/// Files on local disk, served by the binary under `/uploads`.
pub struct LocalStore {
    directory: PathBuf,
    public_base_url: String,
}

impl LocalStore {
    pub fn new(directory: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            directory: directory.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }
}

#[async_trait]
impl FileStore for LocalStore {
    async fn store_pdf(&self, name: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.directory.join(name);
        tokio::fs::write(&path, &bytes).await?;
        info!(path = %path.display(), size = bytes.len(), "upload stored");
        Ok(format!("{}/uploads/{name}", self.public_base_url))
    }

    async fn presign_upload(
        &self,
        _file_name: &str,
        _content_type: &str,
    ) -> Result<PresignedUpload, StorageError> {
        Err(StorageError::Unsupported)
    }

    async fn presign_download(&self, _key: &str) -> Result<String, StorageError> {
        Err(StorageError::Unsupported)
    }
}
