pub mod config;
pub mod storage;

pub use config::{ConfigurationSource, LayeredConfigSource, UploaderConfig};
pub use storage::StorageError;
