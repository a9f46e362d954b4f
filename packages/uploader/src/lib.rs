pub mod error;
pub mod filename;
pub mod key;
pub mod models;
pub mod resolver;
pub mod url;

pub use error::{InputRejection, UploadError};
pub use filename::{SanitizedName, sanitize_name};
pub use key::{StorageKey, build_candidate_key};
pub use models::{UploadRequest, UploadResult, UploadSource};
pub use resolver::{CheckErrorPolicy, NAME_ATTEMPTS, UploadKeyResolver, resolve_upload_directory};
pub use url::public_url;
