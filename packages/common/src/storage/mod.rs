mod error;
mod path;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

pub use error::StorageError;
pub use path::{normalize_path, normalize_prefix};
pub use traits::{BackendKind, ObjectStore};

use crate::config::StorageConfig;
use filesystem::FilesystemStore;

/// Process-wide storage handle.
///
/// Wraps whichever [`ObjectStore`] was selected at startup and turns every
/// backend failure into a logged `false` so callers can keep going with the
/// rest of their work.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn ObjectStore>,
    spool_dir: Option<PathBuf>,
}

impl Storage {
    /// Build the backend chosen by `config`: the object store when an access
    /// key is configured, the local filesystem otherwise.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.s3.is_enabled() {
            #[cfg(feature = "object-storage")]
            {
                let store = s3::S3Store::new(&config.s3)?;
                info!(
                    bucket = config.s3.bucket.as_deref().unwrap_or_default(),
                    "Using object storage for images"
                );
                return Ok(Self::new(Arc::new(store)));
            }
            #[cfg(not(feature = "object-storage"))]
            return Err(StorageError::Config(
                "storage.s3.access_key is set but object storage support is not compiled in"
                    .into(),
            ));
        }

        let store = FilesystemStore::new(config.root.clone(), config.url_prefix.clone()).await?;
        info!(root = %config.root.display(), "Using local filesystem for images");
        Ok(Self::filesystem(store))
    }

    /// Wrap an arbitrary backend. No upload spooling directory is set.
    pub fn new(backend: Arc<dyn ObjectStore>) -> Self {
        Self {
            backend,
            spool_dir: None,
        }
    }

    /// Wrap a filesystem store; uploads are spooled into its temp directory.
    pub fn filesystem(store: FilesystemStore) -> Self {
        let spool_dir = Some(store.temp_dir());
        Self {
            backend: Arc::new(store),
            spool_dir,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Where raw uploads may be spooled before processing, if anywhere.
    pub fn spool_dir(&self) -> Option<&PathBuf> {
        self.spool_dir.as_ref()
    }

    pub async fn put(&self, data: &[u8], path: &str, content_type: &str) -> bool {
        match self.backend.put(path, data, content_type).await {
            Ok(()) => true,
            Err(e) => {
                error!(path, content_type, error = %e, "Failed to store object");
                false
            }
        }
    }

    /// Delete one object. A missing object counts as deleted.
    pub async fn delete(&self, path: &str) -> bool {
        match self.backend.delete(path).await {
            Ok(existed) => {
                if !existed {
                    warn!(path, "Object to delete did not exist");
                }
                true
            }
            Err(e) => {
                error!(path, error = %e, "Failed to delete object");
                false
            }
        }
    }

    pub async fn delete_many(&self, paths: &[String]) -> bool {
        if paths.is_empty() {
            return true;
        }
        match self.backend.delete_many(paths).await {
            Ok(()) => true,
            Err(e) => {
                error!(count = paths.len(), error = %e, "Failed to delete objects");
                false
            }
        }
    }

    /// List object paths under `prefix`; an unreadable backend lists as empty.
    pub async fn list(&self, prefix: &str) -> Vec<String> {
        match self.backend.list(prefix).await {
            Ok(paths) => paths,
            Err(e) => {
                error!(prefix, error = %e, "Failed to list objects");
                Vec::new()
            }
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        self.backend.public_url(path)
    }
}
