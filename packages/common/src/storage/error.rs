use thiserror::Error;

/// Errors that can occur during object storage and local mirror operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The remote store rejected the request or could not be reached.
    #[error("remote storage error: {0}")]
    Remote(String),

    /// The client could not be built from the current settings.
    #[error("storage configuration error: {0}")]
    Config(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "object-storage")]
impl From<s3::error::S3Error> for StorageError {
    fn from(err: s3::error::S3Error) -> Self {
        Self::Remote(err.to_string())
    }
}
