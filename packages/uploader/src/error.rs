use common::storage::StorageError;
use thiserror::Error;

/// Why an upload was refused before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputRejection {
    #[error("file name is empty")]
    EmptyName,

    #[error("file type '{0}' is not allowed")]
    DisallowedType(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload rejected: {0}")]
    InputRejected(#[from] InputRejection),

    #[error("Remote write failed: {0}")]
    RemoteWrite(#[source] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UploadError>;
