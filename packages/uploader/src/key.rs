use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};

static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Object key of the form `{dir}/{year}/{month}/{name}.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    /// Partition directory, `{upload_dir}/{year}/{month}`.
    pub dir: String,
    /// Generated decimal file name, without extension.
    pub name: String,
    pub extension: String,
}

impl StorageKey {
    /// File name including the extension.
    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.extension)
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dir.is_empty() {
            write!(f, "{}", self.file_name())
        } else {
            write!(f, "{}/{}", self.dir, self.file_name())
        }
    }
}

/// Express `at` in the configured partition time zone.
///
/// Offsets outside ±24h fall back to UTC.
pub fn partition_time(at: DateTime<Utc>, offset_secs: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| Utc.fix());
    at.with_timezone(&offset)
}

/// A process-local token that differs between calls.
///
/// Combines the optional retry seed, the current time and process data. It is
/// not globally unique; two processes may produce the same token.
pub fn unique_token(seed: Option<u32>) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let count = TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed);
    let prefix = seed.map(|s| s.to_string()).unwrap_or_default();

    format!(
        "{prefix}{:08x}{:05x}.{:x}.{count:x}",
        now.as_secs(),
        now.subsec_micros(),
        std::process::id(),
    )
}

/// Build a candidate key for one upload attempt.
///
/// The name is the decimal CRC32 of a fresh [`unique_token`]; it is a
/// best-effort collision-unlikely name, not a content hash.
pub fn build_candidate_key(
    upload_dir: &str,
    timestamp: DateTime<FixedOffset>,
    extension: &str,
    seed: Option<u32>,
) -> StorageKey {
    let partition = format!("{:04}/{:02}", timestamp.year(), timestamp.month());
    let dir = if upload_dir.is_empty() {
        partition
    } else {
        format!("{upload_dir}/{partition}")
    };

    StorageKey {
        dir,
        name: crc32fast::hash(unique_token(seed).as_bytes()).to_string(),
        extension: extension.to_string(),
    }
}
