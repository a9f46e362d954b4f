use std::sync::Arc;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::traits::{BoxReader, ObjectStore, PutOptions};
use crate::config::{ConfigurationSource, R2Config};

/// R2 does not partition by region; the S3 API expects this placeholder.
pub const R2_REGION: &str = "auto";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Cloudflare R2 backed object store.
///
/// The S3 client is rebuilt from the configuration source on every request,
/// so credential or endpoint changes apply to the next call.
pub struct R2ObjectStore {
    config: Arc<dyn ConfigurationSource>,
}

impl R2ObjectStore {
    pub fn new(config: Arc<dyn ConfigurationSource>) -> Self {
        Self { config }
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, StorageError> {
        let settings = self
            .config
            .load()
            .map_err(|e| StorageError::Config(e.to_string()))?;
        open_bucket(&settings.r2, name)
    }

    fn writable_bucket(
        &self,
        name: &str,
        options: &PutOptions,
    ) -> Result<Box<Bucket>, StorageError> {
        let mut bucket = self.bucket(name)?;
        bucket.add_header("x-amz-acl", options.visibility.as_acl());
        Ok(bucket)
    }
}

/// Build a path-style bucket handle for the given R2 account settings.
pub fn open_bucket(r2: &R2Config, name: &str) -> Result<Box<Bucket>, StorageError> {
    let region = Region::Custom {
        region: R2_REGION.to_string(),
        endpoint: r2.endpoint(),
    };

    let credentials = Credentials::new(
        Some(&r2.access_key_id),
        Some(&r2.access_key_secret),
        None,
        None,
        None,
    )
    .map_err(|e| StorageError::Config(e.to_string()))?;

    let bucket = Bucket::new(name, region, credentials)?.with_path_style();
    Ok(bucket)
}

#[async_trait]
impl ObjectStore for R2ObjectStore {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        let bucket = self.bucket(bucket)?;
        let found = bucket.object_exists(key).await?;
        debug!(key, found, "Checked object existence");
        Ok(found)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        mut body: BoxReader,
        options: PutOptions,
    ) -> Result<(), StorageError> {
        let bucket = self.writable_bucket(bucket, &options)?;
        let response = bucket
            .put_object_stream_with_content_type(&mut body, key, content_type(&options))
            .await?;

        check_status(key, response.status_code())?;
        debug!(key, bytes = response.uploaded_bytes(), "Streamed object");
        Ok(())
    }

    async fn put_bytes(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        options: PutOptions,
    ) -> Result<(), StorageError> {
        let bucket = self.writable_bucket(bucket, &options)?;
        let response = bucket
            .put_object_with_content_type(key, data, content_type(&options))
            .await?;

        check_status(key, response.status_code())?;
        debug!(key, bytes = data.len(), "Stored object");
        Ok(())
    }
}

fn content_type(options: &PutOptions) -> &str {
    options
        .content_type
        .as_deref()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

fn check_status(key: &str, status: u16) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StorageError::Remote(format!(
            "put {key} returned HTTP {status}"
        )))
    }
}
