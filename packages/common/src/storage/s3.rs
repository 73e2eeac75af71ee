use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::path::{normalize_path, normalize_prefix};
use super::traits::{BackendKind, ObjectStore};
use crate::config::S3Config;

/// S3-compatible object store (DigitalOcean Spaces, MinIO, AWS S3).
///
/// Every upload is written with a `public-read` ACL so renditions can be
/// served straight from the bucket's CDN.
pub struct S3Store {
    bucket: Box<Bucket>,
    public_base: String,
}

impl S3Store {
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let access_key = required(&config.access_key, "access_key")?;
        let secret_key = required(&config.secret_key, "secret_key")?;
        let bucket_name = required(&config.bucket, "bucket")?;
        let region_name = required(&config.region, "region")?;

        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{region_name}.digitaloceanspaces.com"));
        let region = Region::Custom {
            region: region_name.to_string(),
            endpoint,
        };

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::Config(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(format!("invalid bucket: {e}")))?;
        bucket.add_header("x-amz-acl", "public-read");

        let public_base = config
            .public_url
            .clone()
            .unwrap_or_else(|| format!("https://{bucket_name}.{region_name}.cdn.digitaloceanspaces.com"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            bucket,
            public_base,
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, StorageError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StorageError::Config(format!("storage.s3.{name} is not set")))
}

fn check_status(status: u16, action: &str, path: &str) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StorageError::Remote(format!(
            "{action} {path} returned HTTP {status}"
        )))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, path: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        let key = normalize_path(path)?;
        let response = self
            .bucket
            .put_object_with_content_type(&key, data, content_type)
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;
        check_status(response.status_code(), "PUT", &key)
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let key = normalize_path(path)?;
        let response = self
            .bucket
            .delete_object(&key)
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;
        match response.status_code() {
            404 => Ok(false),
            status => check_status(status, "DELETE", &key).map(|_| true),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = normalize_prefix(prefix)?;
        let results = self
            .bucket
            .list(prefix, None)
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        let mut keys: Vec<String> = results
            .into_iter()
            .flat_map(|page| page.contents.into_iter().map(|object| object.key))
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base, path.trim_start_matches('/'))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::ObjectStore
    }
}
