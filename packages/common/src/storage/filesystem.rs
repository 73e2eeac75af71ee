use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::path::{normalize_path, normalize_prefix};
use super::traits::{BackendKind, ObjectStore};

/// Directory under the root used for in-flight writes and upload spooling.
pub const TEMP_DIR: &str = ".tmp";

/// Filesystem-backed object store.
///
/// Objects live at `{root}/{path}`; e.g. `medium/3f2a.jpg` is written to
/// `{root}/medium/3f2a.jpg`. Writes go through `{root}/.tmp` and are renamed
/// into place so readers never observe a half-written file.
pub struct FilesystemStore {
    root: PathBuf,
    url_prefix: String,
}

impl FilesystemStore {
    /// Create a new filesystem store rooted at `root`, served under `url_prefix`.
    pub async fn new(root: PathBuf, url_prefix: impl Into<String>) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(TEMP_DIR)).await?;
        Ok(Self {
            root,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for scratch files that must not be listed as objects.
    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR)
    }

    fn object_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        let path = normalize_path(path)?;
        Ok(self.root.join(path))
    }

    fn temp_path(&self) -> PathBuf {
        self.temp_dir().join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn put(&self, path: &str, data: &[u8], _content_type: &str) -> Result<(), StorageError> {
        let object_path = self.object_path(path)?;

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let object_path = self.object_path(path)?;
        match fs::remove_file(&object_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = normalize_prefix(prefix)?;
        let start = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&prefix)
        };

        let mut found = Vec::new();
        let mut pending = vec![start];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let Ok(relative) = path.strip_prefix(&self.root) else {
                    continue;
                };
                if relative.starts_with(TEMP_DIR) {
                    continue;
                }
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else {
                    let key: Vec<String> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    found.push(key.join("/"));
                }
            }
        }

        found.sort();
        Ok(found)
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.url_prefix, path.trim_start_matches('/'))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Filesystem
    }
}
