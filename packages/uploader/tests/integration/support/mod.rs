use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::config::UploaderConfig;
use common::storage::{BoxReader, LocalFilesystem, ObjectStore, PutOptions, StorageError};
use tokio::io::AsyncReadExt;
use uploader::UploadKeyResolver;

/// How the mock store answers existence checks.
#[derive(Debug, Clone, Copy)]
pub enum ExistsMode {
    Always,
    Never,
    Fail,
    /// The first `n` checks collide, later ones are free.
    TakenFor(usize),
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub data: Vec<u8>,
    pub options: PutOptions,
}

pub struct MockStore {
    mode: ExistsMode,
    fail_put: bool,
    exists_calls: AtomicUsize,
    checked: Mutex<Vec<String>>,
    puts: Mutex<Vec<StoredObject>>,
}

impl MockStore {
    pub fn new(mode: ExistsMode) -> Arc<Self> {
        Arc::new(Self::build(mode, false))
    }

    pub fn failing_put() -> Arc<Self> {
        Arc::new(Self::build(ExistsMode::Never, true))
    }

    fn build(mode: ExistsMode, fail_put: bool) -> Self {
        Self {
            mode,
            fail_put,
            exists_calls: AtomicUsize::new(0),
            checked: Mutex::new(Vec::new()),
            puts: Mutex::new(Vec::new()),
        }
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn checked(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<StoredObject> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn exists(&self, _bucket: &str, key: &str) -> Result<bool, StorageError> {
        let call = self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.checked.lock().unwrap().push(key.to_string());
        match self.mode {
            ExistsMode::Always => Ok(true),
            ExistsMode::Never => Ok(false),
            ExistsMode::Fail => Err(StorageError::Remote("connection reset".into())),
            ExistsMode::TakenFor(n) => Ok(call < n),
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        mut body: BoxReader,
        options: PutOptions,
    ) -> Result<(), StorageError> {
        if self.fail_put {
            return Err(StorageError::Remote("simulated network error".into()));
        }

        let mut data = Vec::new();
        body.read_to_end(&mut data).await?;
        self.puts.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            data,
            options,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCall {
    IsDir(PathBuf),
    CreateDir(PathBuf),
    Move(PathBuf, PathBuf),
    Write(PathBuf),
}

/// Records every filesystem call; directory creation can be made to fail.
pub struct MockFs {
    existing: Mutex<HashSet<PathBuf>>,
    fail_mkdir: bool,
    calls: Mutex<Vec<FsCall>>,
}

impl MockFs {
    pub fn new(root: &Path) -> Arc<Self> {
        Arc::new(Self::build(root, false))
    }

    pub fn failing_mkdir(root: &Path) -> Arc<Self> {
        Arc::new(Self::build(root, true))
    }

    fn build(root: &Path, fail_mkdir: bool) -> Self {
        Self {
            existing: Mutex::new(HashSet::from([root.to_path_buf()])),
            fail_mkdir,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<FsCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: FsCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LocalFilesystem for MockFs {
    async fn is_dir(&self, path: &Path) -> bool {
        self.record(FsCall::IsDir(path.to_path_buf()));
        self.existing.lock().unwrap().contains(path)
    }

    async fn create_dir(&self, path: &Path) -> Result<(), StorageError> {
        self.record(FsCall::CreateDir(path.to_path_buf()));
        if self.fail_mkdir {
            return Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied).into());
        }
        self.existing.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }

    async fn move_file(&self, src: &Path, dst: &Path) -> Result<(), StorageError> {
        self.record(FsCall::Move(src.to_path_buf(), dst.to_path_buf()));
        Ok(())
    }

    async fn write_file(&self, dst: &Path, _data: &[u8]) -> Result<(), StorageError> {
        self.record(FsCall::Write(dst.to_path_buf()));
        Ok(())
    }
}

pub fn test_config(mirror_root: &Path) -> UploaderConfig {
    let mut config = UploaderConfig::default();
    config.r2.account_id = "acct".into();
    config.r2.bucket = "media".into();
    config.r2.access_domain = "cdn.example.com".into();
    config.upload.path = Some("usr/uploads".into());
    config.upload.mirror_root = mirror_root.to_path_buf();
    config
}

pub fn resolver(
    config: UploaderConfig,
    store: Arc<MockStore>,
    fs: Arc<dyn LocalFilesystem>,
) -> UploadKeyResolver {
    UploadKeyResolver::new(Arc::new(config), store, fs)
}

/// `{dir}/{digits}.{ext}` with a purely numeric generated name.
pub fn assert_generated_key(key: &str, dir: &str, ext: &str) {
    let rest = key
        .strip_prefix(&format!("{dir}/"))
        .unwrap_or_else(|| panic!("{key} is not under {dir}"));
    let name = rest
        .strip_suffix(&format!(".{ext}"))
        .unwrap_or_else(|| panic!("{key} does not end with .{ext}"));
    assert!(!name.is_empty());
    assert!(
        name.chars().all(|c| c.is_ascii_digit()),
        "{name} is not numeric"
    );
}
