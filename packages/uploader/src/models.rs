use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the bytes of an upload come from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// A temporary file written by the host; moved into the local mirror on success.
    File(PathBuf),
    /// In-memory content; written into the local mirror on success.
    Bytes(Vec<u8>),
}

/// One file handed over by the host for upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original, untrusted file name.
    pub name: String,
    pub source: UploadSource,
    /// Size declared by the host, in bytes.
    pub size: u64,
    /// Content type reported by the client, if any.
    pub mime_hint: Option<String>,
}

impl UploadRequest {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: data.len() as u64,
            source: UploadSource::Bytes(data),
            mime_hint: None,
        }
    }

    pub fn from_file(name: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            source: UploadSource::File(path.into()),
            size,
            mime_hint: None,
        }
    }
}

/// Attachment metadata handed back to the host after a successful remote write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Basename of the upload name, with directories, quotes and angle brackets removed.
    pub name: String,
    /// Object key the bytes were stored under.
    pub path: String,
    pub size: u64,
    /// Lowercased extension.
    #[serde(rename = "type")]
    pub extension: String,
    pub mime: Option<String>,
}
