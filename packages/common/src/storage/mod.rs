mod error;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod r2;

pub use error::StorageError;
pub use filesystem::{LocalFilesystem, TokioFilesystem};
pub use traits::{BoxReader, ObjectStore, PutOptions, Visibility};
