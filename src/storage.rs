use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tracing::{debug, info};

use crate::config::StorageConfig;

/// SigV4 presigned URLs cannot outlive seven days.
pub const MAX_PRESIGN_SECS: u64 = 7 * 24 * 60 * 60;

/// Bucket holding recipe images. Keys are the `recipes.image` column values.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// Time-limited GET URL for `key`.
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

/// Lifetime actually requested from S3 for a configured TTL.
pub fn presign_ttl(seconds: u64) -> Duration {
    Duration::from_secs(seconds.clamp(1, MAX_PRESIGN_SECS))
}

/// S3 or any S3-compatible store (MinIO in development).
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(&cfg.access_key, &cfg.secret_key, None, None, "recipebox-env");
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        // MinIO only serves path-style requests
        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        info!(endpoint = %cfg.endpoint, bucket = %cfg.bucket, "image storage configured");
        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(size as i64)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("upload {} to bucket {}", key, self.bucket))?;
        debug!(%key, size, content_type, "image uploaded");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("delete {} from bucket {}", key, self.bucket))?;
        debug!(%key, "image deleted");
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let presigning = PresigningConfig::expires_in(presign_ttl(seconds)).context("presign lifetime")?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .with_context(|| format!("presign {}", key))?;
        Ok(request.uri().to_string())
    }
}
