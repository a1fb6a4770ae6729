use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::info;

use super::{upload_key, FileStore, PresignedUpload, StorageError};
use crate::config::S3Config;

/// S3-compatible object store. Custom endpoints use path-style addressing.
pub struct S3Store {
    client: Client,
    bucket: String,
    object_base: String,
    presign_ttl: Duration,
}

impl S3Store {
    pub fn new(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "baujobs",
        );
        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        let object_base = match &config.endpoint {
            Some(endpoint) => {
                builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
                format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket)
            }
            None => format!(
                "https://{}.s3.{}.amazonaws.com",
                config.bucket, config.region
            ),
        };
        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            object_base,
            presign_ttl: Duration::from_secs(config.presign_ttl_secs),
        }
    }

    fn presigning(&self) -> Result<PresigningConfig, StorageError> {
        PresigningConfig::expires_in(self.presign_ttl)
            .map_err(|err| StorageError::Provider(err.to_string()))
    }
}

#[async_trait]
impl FileStore for S3Store {
    async fn store_pdf(&self, name: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let key = format!("uploads/{name}");
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(mime::APPLICATION_PDF.as_ref())
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| StorageError::Provider(err.to_string()))?;
        info!(bucket = %self.bucket, %key, size, "upload stored");
        Ok(format!("{}/{key}", self.object_base))
    }

    async fn presign_upload(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<PresignedUpload, StorageError> {
        let key = upload_key(file_name);
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .presigned(self.presigning()?)
            .await
            .map_err(|err| StorageError::Provider(err.to_string()))?;
        Ok(PresignedUpload {
            upload_url: request.uri().to_string(),
            key,
        })
    }

    async fn presign_download(&self, key: &str) -> Result<String, StorageError> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(self.presigning()?)
            .await
            .map_err(|err| StorageError::Provider(err.to_string()))?;
        Ok(request.uri().to_string())
    }
}
