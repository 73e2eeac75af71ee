use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use common::Storage;
use image::{DynamicImage, ImageReader};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::rendition::{self, OutputFormat};
use crate::config::{ImageConfig, RenditionSpec};
use crate::utils::filename::validate_flat_filename;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("unsupported image extension for {0:?} (allowed: png, jpg, jpeg, gif)")]
    UnsupportedExtension(String),
    #[error("invalid filename: {0}")]
    InvalidFilename(&'static str),
    #[error("failed to spool upload: {0}")]
    Spool(#[from] io::Error),
    #[error("could not decode image: {0}")]
    Decode(String),
}

/// Stored rendition paths keyed by rendition name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenditionSet {
    paths: BTreeMap<String, String>,
}

impl RenditionSet {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn get(&self, rendition: &str) -> Option<&str> {
        self.paths.get(rendition).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Turns one upload into a bounded, format-normalised rendition per
/// configured size and writes each through [`Storage`].
#[derive(Clone)]
pub struct ImagePipeline {
    storage: Storage,
    renditions: Arc<[RenditionSpec]>,
    quality: u8,
}

/// A raw upload written to the spool directory. Removed on drop.
struct SpoolFile {
    path: PathBuf,
}

impl SpoolFile {
    async fn create(dir: &Path, data: &[u8]) -> io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(Uuid::new_v4().simple().to_string());
        tokio::fs::write(&path, data).await?;
        Ok(Self { path })
    }
}

impl Drop for SpoolFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "Failed to remove spooled upload");
        }
    }
}

/// Where each rendition decodes its source from.
enum Source {
    /// Local backend: decode fresh from disk for every rendition.
    Spooled(SpoolFile),
    /// Object store: decode once in memory and share.
    Decoded(Arc<DynamicImage>),
}

enum RenderFailure {
    Decode(String),
    Encode(String),
}

impl ImagePipeline {
    pub fn new(storage: Storage, config: &ImageConfig) -> Self {
        Self {
            storage,
            renditions: config.renditions.clone().into(),
            quality: config.quality.clamp(1, 100),
        }
    }

    pub fn renditions(&self) -> &[RenditionSpec] {
        &self.renditions
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Store every configured rendition of `source` under
    /// `<rendition>/<canonical_filename>`.
    ///
    /// Individual rendition failures are logged and left out of the result;
    /// an empty set means nothing was stored. Bad extensions and undecodable
    /// input are rejected before anything is written.
    #[instrument(skip(self, source), fields(filename = %canonical_filename, bytes = source.len()))]
    pub async fn process(
        &self,
        source: Bytes,
        canonical_filename: &str,
    ) -> Result<RenditionSet, PipelineError> {
        let filename = validate_flat_filename(canonical_filename)
            .map_err(|e| PipelineError::InvalidFilename(e.message()))?;
        let ext = rendition::allowed_extension(filename)
            .ok_or_else(|| PipelineError::UnsupportedExtension(filename.to_string()))?;
        let format = OutputFormat::from_extension(&ext);

        let origin = match self.storage.spool_dir() {
            Some(dir) => Source::Spooled(SpoolFile::create(dir, &source).await?),
            None => {
                let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&source))
                    .await
                    .map_err(|e| PipelineError::Decode(e.to_string()))?
                    .map_err(|e| PipelineError::Decode(e.to_string()))?;
                Source::Decoded(Arc::new(decoded))
            }
        };

        let mut set = RenditionSet::default();
        for spec in self.renditions.iter() {
            let encoded = match self.render_one(&origin, spec, format).await {
                Ok(bytes) => bytes,
                Err(RenderFailure::Decode(reason)) => {
                    // Every rendition decodes the same bytes.
                    return Err(PipelineError::Decode(reason));
                }
                Err(RenderFailure::Encode(reason)) => {
                    error!(rendition = %spec.name, error = %reason, "Failed to render image");
                    continue;
                }
            };

            let path = format!("{}/{}", spec.name, filename);
            if self
                .storage
                .put(&encoded, &path, format.content_type())
                .await
            {
                set.paths.insert(spec.name.clone(), path);
            } else {
                warn!(rendition = %spec.name, "Rendition not stored");
            }
        }

        if set.is_empty() {
            warn!("No renditions were stored");
        } else {
            info!(stored = set.len(), "Processed image upload");
        }
        Ok(set)
    }

    async fn render_one(
        &self,
        source: &Source,
        spec: &RenditionSpec,
        format: OutputFormat,
    ) -> Result<Vec<u8>, RenderFailure> {
        let spec = spec.clone();
        let quality = self.quality;

        let task = match source {
            Source::Spooled(spool) => {
                let path = spool.path.clone();
                tokio::task::spawn_blocking(move || {
                    let img = ImageReader::open(&path)
                        .and_then(|r| r.with_guessed_format())
                        .map_err(|e| RenderFailure::Decode(e.to_string()))?
                        .decode()
                        .map_err(|e| RenderFailure::Decode(e.to_string()))?;
                    rendition::render(img, &spec, format, quality)
                        .map_err(|e| RenderFailure::Encode(e.to_string()))
                })
            }
            Source::Decoded(img) => {
                let img = Arc::clone(img);
                tokio::task::spawn_blocking(move || {
                    rendition::render((*img).clone(), &spec, format, quality)
                        .map_err(|e| RenderFailure::Encode(e.to_string()))
                })
            }
        };

        task.await
            .map_err(|e| RenderFailure::Encode(format!("render task failed: {e}")))?
    }
}
