use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::config::{ConfigurationSource, DEFAULT_UPLOAD_DIR, UploadConfig, UploaderConfig};
use common::storage::r2::R2ObjectStore;
use common::storage::{
    BoxReader, LocalFilesystem, ObjectStore, PutOptions, TokioFilesystem, Visibility,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{InputRejection, Result, UploadError};
use crate::filename::{SanitizedName, is_allowed_type, sanitize_name};
use crate::key::{StorageKey, build_candidate_key, partition_time};
use crate::models::{UploadRequest, UploadResult, UploadSource};
use crate::url::public_url;

/// Number of existence checks before settling for the last candidate.
pub const NAME_ATTEMPTS: u32 = 10;

/// Outcome of asking the store whether a key is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Existence {
    Exists,
    Absent,
    CheckFailed,
}

/// Seeds for the regenerated candidates, counting down from [`NAME_ATTEMPTS`].
fn retry_seeds() -> impl Iterator<Item = u32> {
    (1..=NAME_ATTEMPTS).rev()
}

/// How a failed existence check is interpreted by the collision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckErrorPolicy {
    /// Proceed as if the key were free (`assume_absent_on_check_error = true`).
    AssumeAbsent,
    /// Count the failure as a collision and try another name.
    AssumeExists,
}

impl CheckErrorPolicy {
    pub fn from_config(upload: &UploadConfig) -> Self {
        if upload.assume_absent_on_check_error {
            Self::AssumeAbsent
        } else {
            Self::AssumeExists
        }
    }

    fn is_collision(self, existence: Existence) -> bool {
        match existence {
            Existence::Exists => true,
            Existence::Absent => false,
            Existence::CheckFailed => self == Self::AssumeExists,
        }
    }
}

/// Upload directory in priority order: configured path, host default, constant.
pub fn resolve_upload_directory(upload: &UploadConfig) -> String {
    let configured = |v: &Option<String>| {
        v.as_deref()
            .map(|s| s.trim().trim_end_matches(['/', '\\']))
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    configured(&upload.path)
        .or_else(|| configured(&upload.host_dir))
        .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string())
}

/// Turns untrusted uploads into collision-checked object keys and stores them.
///
/// Settings are re-read from the configuration source once per upload.
pub struct UploadKeyResolver {
    config: Arc<dyn ConfigurationSource>,
    store: Arc<dyn ObjectStore>,
    fs: Arc<dyn LocalFilesystem>,
}

impl UploadKeyResolver {
    pub fn new(
        config: Arc<dyn ConfigurationSource>,
        store: Arc<dyn ObjectStore>,
        fs: Arc<dyn LocalFilesystem>,
    ) -> Self {
        Self { config, store, fs }
    }

    /// Resolver backed by Cloudflare R2 and the local disk.
    pub fn r2(config: Arc<dyn ConfigurationSource>) -> Self {
        let store = Arc::new(R2ObjectStore::new(Arc::clone(&config)));
        Self::new(config, store, Arc::new(TokioFilesystem))
    }

    /// Full host upload: validate, place, upload and mirror one file.
    #[instrument(skip(self, request), fields(name = %request.name, size = request.size))]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult> {
        if request.name.is_empty() {
            return Err(InputRejection::EmptyName.into());
        }

        let config = self.config.load()?;

        let SanitizedName {
            base_name,
            extension,
        } = sanitize_name(&request.name);
        if !is_allowed_type(&extension, &config.upload.allowed_types) {
            info!(extension = %extension, "Rejected upload with disallowed type");
            return Err(InputRejection::DisallowedType(extension).into());
        }

        let upload_dir = resolve_upload_directory(&config.upload);
        let key = self
            .resolve_unique_key(&config, &upload_dir, &extension, Utc::now())
            .await;

        // Only the sanitized basename is handed back to the host.
        let request = UploadRequest {
            name: base_name,
            ..request
        };
        self.upload_and_record(&config, request, key).await
    }

    /// Pick a key under `{upload_dir}/{year}/{month}` that the store does not
    /// report as taken.
    ///
    /// Makes at most [`NAME_ATTEMPTS`] existence checks. When every check
    /// collides, the last generated candidate is returned unchecked.
    pub async fn resolve_unique_key(
        &self,
        config: &UploaderConfig,
        upload_dir: &str,
        extension: &str,
        at: DateTime<Utc>,
    ) -> StorageKey {
        let policy = CheckErrorPolicy::from_config(&config.upload);
        let timestamp = partition_time(at, config.upload.timezone_offset_secs);

        let mut key = build_candidate_key(upload_dir, timestamp, extension, None);
        for seed in retry_seeds() {
            if !policy.is_collision(self.check(&config.r2.bucket, &key).await) {
                return key;
            }
            debug!(key = %key, seed, "Key taken, generating another");
            key = build_candidate_key(upload_dir, timestamp, extension, Some(seed));
        }

        warn!(key = %key, "Collision budget exhausted, using last candidate");
        key
    }

    async fn check(&self, bucket: &str, key: &StorageKey) -> Existence {
        match self.store.exists(bucket, &key.to_string()).await {
            Ok(true) => Existence::Exists,
            Ok(false) => Existence::Absent,
            Err(e) => {
                warn!(key = %key, error = %e, "Existence check failed");
                Existence::CheckFailed
            }
        }
    }

    /// Write the request to `key` with public-read visibility, then mirror it
    /// locally.
    ///
    /// Only the remote write can fail the call. Mirror problems are logged.
    pub async fn upload_and_record(
        &self,
        config: &UploaderConfig,
        request: UploadRequest,
        key: StorageKey,
    ) -> Result<UploadResult> {
        let path = key.to_string();
        let mime = mime_guess::from_ext(&key.extension)
            .first()
            .map(|m| m.to_string())
            .or_else(|| request.mime_hint.clone());
        let options = PutOptions {
            visibility: Visibility::PublicRead,
            content_type: mime.clone(),
        };

        let bucket = &config.r2.bucket;
        let stored = match &request.source {
            UploadSource::Bytes(data) => self.store.put_bytes(bucket, &path, data, options).await,
            UploadSource::File(file) => {
                let body: BoxReader = Box::new(tokio::fs::File::open(file).await?);
                self.store.put_object(bucket, &path, body, options).await
            }
        };
        if let Err(e) = stored {
            error!(key = %path, error = %e, "Remote write failed");
            return Err(UploadError::RemoteWrite(e));
        }
        info!(key = %path, bucket = %bucket, "Uploaded object");

        if config.upload.local_mirror {
            self.mirror(&config.upload.mirror_root, &request.source, &key)
                .await;
        }

        Ok(UploadResult {
            name: request.name,
            path,
            size: request.size,
            extension: key.extension,
            mime,
        })
    }

    async fn mirror(&self, root: &Path, source: &UploadSource, key: &StorageKey) {
        let dir = root.join(&key.dir);
        if !self.fs.make_upload_dir(&dir).await {
            warn!(dir = %dir.display(), "Could not create mirror directory");
            return;
        }

        let dst = dir.join(key.file_name());
        let outcome = match source {
            UploadSource::File(src) => self.fs.move_file(src, &dst).await,
            UploadSource::Bytes(data) => self.fs.write_file(&dst, data).await,
        };
        match outcome {
            Ok(()) => debug!(path = %dst.display(), "Mirrored upload locally"),
            Err(e) => warn!(path = %dst.display(), error = %e, "Local mirror failed"),
        }
    }

    /// Public URL for a previously stored key, using the current access domain.
    pub fn attachment_url(&self, stored_key: &str) -> Result<String> {
        let config = self.config.load()?;
        Ok(public_url(&config.r2.access_domain, stored_key))
    }
}
