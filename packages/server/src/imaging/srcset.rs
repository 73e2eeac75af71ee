use std::sync::Arc;

use common::Storage;

use crate::config::RenditionSpec;

/// `sizes` attribute paired with every descriptor.
pub const SIZES_HINT: &str = "(max-width: 600px) 100vw, (max-width: 1200px) 50vw, 800px";

/// Rebuilds rendition URLs from a canonical filename without touching storage.
#[derive(Clone)]
pub struct ResponsiveImages {
    storage: Storage,
    renditions: Arc<[RenditionSpec]>,
}

impl ResponsiveImages {
    pub fn new(storage: Storage, renditions: &[RenditionSpec]) -> Self {
        Self {
            storage,
            renditions: renditions.into(),
        }
    }

    /// Public URL of one rendition.
    pub fn url(&self, rendition: &str, filename: &str) -> String {
        self.storage
            .public_url(&format!("{rendition}/{}", basename(filename)))
    }

    /// URL of the first configured rendition, normally the thumbnail.
    pub fn thumbnail_url(&self, filename: &str) -> Option<String> {
        let first = self.renditions.first()?;
        Some(self.url(&first.name, filename))
    }

    /// `srcset` value such as `/static/images/thumbnail/a.jpg 300w, ...`.
    /// Empty for an empty filename.
    pub fn build_descriptor(&self, filename: &str) -> String {
        if filename.is_empty() {
            return String::new();
        }
        self.renditions
            .iter()
            .map(|spec| {
                format!(
                    "{} {}w",
                    self.url(&spec.name, filename),
                    spec.max_width.max(spec.max_height)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn basename(filename: &str) -> &str {
    filename.rsplit('/').next().unwrap_or(filename)
}
