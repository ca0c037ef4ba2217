//! Drive client implementation.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Configuration for the drive client.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for most S3-compatible providers)
    pub region: String,
    /// Lifetime of generated share links
    pub share_link_ttl: Duration,
}

impl DriveConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("DRIVE_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("DRIVE_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("DRIVE_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("DRIVE_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("DRIVE_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("DRIVE_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("DRIVE_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("DRIVE_BUCKET_NAME not set"))?,
            region: std::env::var("DRIVE_REGION").unwrap_or_else(|_| "auto".to_string()),
            share_link_ttl: Duration::from_secs(
                std::env::var("DRIVE_SHARE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(7 * 24 * 3600),
            ),
        })
    }
}

/// S3-compatible drive client.
#[derive(Clone)]
pub struct DriveClient {
    client: Client,
    bucket: String,
    share_link_ttl: Duration,
}

impl DriveClient {
    /// Create a new drive client from configuration.
    pub fn new(config: DriveConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "drive",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            share_link_ttl: config.share_link_ttl,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(DriveConfig::from_env()?))
    }

    /// Upload a file to the drive.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Generate a shareable presigned GET URL for an uploaded object.
    pub async fn share_url(&self, key: &str) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(self.share_link_ttl)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// Upload a file and return its shareable link.
    pub async fn upload_and_share(
        &self,
        path: impl AsRef<Path>,
        key: &str,
    ) -> StorageResult<String> {
        self.upload_file(path, key, "video/mp4").await?;
        self.share_url(key).await
    }
}
