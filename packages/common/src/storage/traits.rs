use async_trait::async_trait;

use super::error::StorageError;

/// Which kind of backend is serving the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Filesystem,
    ObjectStore,
}

/// Path-addressed object storage.
///
/// Paths are relative, `/`-separated keys such as `medium/3f2a.jpg`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` at `path`, replacing any existing object.
    async fn put(&self, path: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Delete the object at `path`.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete every object in `paths`. Each path is attempted even after a
    /// failure; the first error is returned once all have been tried.
    async fn delete_many(&self, paths: &[String]) -> Result<(), StorageError> {
        let mut first_err = None;
        for path in paths {
            if let Err(e) = self.delete(path).await {
                tracing::warn!(path = %path, error = %e, "Delete failed, continuing");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// List object paths under `prefix` (empty prefix lists everything).
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Public URL a browser can fetch the object from.
    fn public_url(&self, path: &str) -> String;

    fn kind(&self) -> BackendKind;
}
