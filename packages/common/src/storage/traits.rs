use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Access policy applied to a newly written object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Private,
    PublicRead,
}

impl Visibility {
    /// Canned ACL name understood by S3-compatible stores.
    pub fn as_acl(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
        }
    }
}

/// Per-object write options.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub visibility: Visibility,
    pub content_type: Option<String>,
}

/// Bucket + key addressed object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists at `key`.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError>;

    /// Stream the full contents of `body` to `key`.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: BoxReader,
        options: PutOptions,
    ) -> Result<(), StorageError>;

    /// Write an in-memory buffer to `key`.
    ///
    /// The default copies `data` into a reader; stores with a direct buffer
    /// upload should override it.
    async fn put_bytes(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        options: PutOptions,
    ) -> Result<(), StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_object(bucket, key, reader, options).await
    }
}
