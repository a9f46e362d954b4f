use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Host-side fallback when neither `upload.path` nor `upload.host_dir` is set.
pub const DEFAULT_UPLOAD_DIR: &str = "usr/uploads";

/// Credentials and addressing for the Cloudflare R2 bucket.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct R2Config {
    pub account_id: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub bucket: String,
    /// Public domain objects are served from (custom domain or r2.dev subdomain).
    pub access_domain: String,
}

impl R2Config {
    /// S3 API endpoint for the configured account.
    pub fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

/// Upload placement and local mirroring settings.
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Explicit upload directory. Takes priority over `host_dir`.
    #[serde(default)]
    pub path: Option<String>,
    /// Host-defined default upload directory.
    #[serde(default)]
    pub host_dir: Option<String>,
    /// Offset from UTC, in seconds, used for the `{year}/{month}` partition. Default: 0.
    #[serde(default)]
    pub timezone_offset_secs: i32,
    /// Root the local mirror is written under. Default: ".".
    #[serde(default = "default_mirror_root")]
    pub mirror_root: PathBuf,
    /// Whether to keep a local copy after a successful remote write. Default: true.
    #[serde(default = "default_local_mirror")]
    pub local_mirror: bool,
    /// Lowercase file extensions accepted for upload.
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
    /// Treat a failed existence check as "no object at this key". Default: true.
    #[serde(default = "default_assume_absent_on_check_error")]
    pub assume_absent_on_check_error: bool,
}

fn default_mirror_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_local_mirror() -> bool {
    true
}
fn default_allowed_types() -> Vec<String> {
    [
        "gif", "jpg", "jpeg", "png", "tiff", "bmp", "webp", "avif", "svg", "ico", "mp3", "wav",
        "ogg", "mp4", "mov", "webm", "avi", "txt", "md", "pdf", "doc", "docx", "xls", "xlsx",
        "ppt", "pptx", "zip", "rar", "7z",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_assume_absent_on_check_error() -> bool {
    true
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: None,
            host_dir: None,
            timezone_offset_secs: 0,
            mirror_root: default_mirror_root(),
            local_mirror: default_local_mirror(),
            allowed_types: default_allowed_types(),
            assume_absent_on_check_error: default_assume_absent_on_check_error(),
        }
    }
}

/// Full uploader configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct UploaderConfig {
    pub r2: R2Config,
    #[serde(default)]
    pub upload: UploadConfig,
}

impl UploaderConfig {
    /// Load from `path` (optional TOML/YAML/JSON file) with `R2UPLOAD__*` overrides.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("upload.timezone_offset_secs", 0_i64)?
            .set_default("upload.mirror_root", ".")?
            .set_default("upload.local_mirror", true)?
            .set_default("upload.assume_absent_on_check_error", true)?
            .add_source(File::with_name(path).required(false))
            // e.g. R2UPLOAD__R2__BUCKET, R2UPLOAD__UPLOAD__PATH
            .add_source(Environment::with_prefix("R2UPLOAD").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

/// Read-only access to the uploader settings.
///
/// Implementations are queried once per upload, so settings changed at runtime
/// are picked up by the next call.
pub trait ConfigurationSource: Send + Sync {
    fn load(&self) -> Result<UploaderConfig, ConfigError>;
}

/// A fixed configuration, mostly useful for tests and embedding.
impl ConfigurationSource for UploaderConfig {
    fn load(&self) -> Result<UploaderConfig, ConfigError> {
        Ok(self.clone())
    }
}

/// Layered file + environment configuration, re-read on every `load`.
#[derive(Debug, Clone)]
pub struct LayeredConfigSource {
    path: String,
}

impl LayeredConfigSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigurationSource for LayeredConfigSource {
    fn load(&self) -> Result<UploaderConfig, ConfigError> {
        UploaderConfig::load_from(&self.path)
    }
}
