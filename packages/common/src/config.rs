use std::path::PathBuf;

use serde::Deserialize;

/// Image storage configuration.
///
/// The object store is used when `s3.access_key` is set; otherwise renditions
/// are written under `root` on the local filesystem.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for the filesystem backend. Default: "./static/images".
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// URL prefix the filesystem backend is served under. Default: "/static/images".
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    #[serde(default)]
    pub s3: S3Config,
}

/// S3-compatible object store credentials.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct S3Config {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Defaults to `https://{region}.digitaloceanspaces.com`.
    pub endpoint: Option<String>,
    /// Defaults to `https://{bucket}.{region}.cdn.digitaloceanspaces.com`.
    pub public_url: Option<String>,
}

impl S3Config {
    /// Presence of an access key is the sole switch to the object store.
    pub fn is_enabled(&self) -> bool {
        self.access_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./static/images")
}
fn default_url_prefix() -> String {
    "/static/images".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            url_prefix: default_url_prefix(),
            s3: S3Config::default(),
        }
    }
}
