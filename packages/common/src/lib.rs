pub mod config;
pub mod retry;
pub mod storage;

pub use config::{S3Config, StorageConfig};
pub use retry::RetryPolicy;
pub use storage::{BackendKind, Storage, StorageError};
