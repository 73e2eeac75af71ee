use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::photo;
use crate::imaging::ResponsiveImages;
use crate::models::shared::date_posted;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PhotoResponse {
    #[schema(example = 12)]
    pub id: i32,
    #[schema(example = "3f2a9c0d4e5b4b6f8a1c2d3e4f5a6b7c.jpg")]
    pub filename: String,
    pub description: Option<String>,
    /// URL of the smallest rendition, for grids.
    pub thumbnail_url: Option<String>,
    pub srcset: String,
    pub date_posted: String,
    pub created_at: DateTime<Utc>,
}

impl PhotoResponse {
    pub fn new(photo: photo::Model, images: &ResponsiveImages) -> Self {
        Self {
            thumbnail_url: images.thumbnail_url(&photo.filename),
            srcset: images.build_descriptor(&photo.filename),
            date_posted: date_posted(&photo.created_at),
            id: photo.id,
            filename: photo.filename,
            description: photo.description,
            created_at: photo.created_at,
        }
    }
}

/// Responsive markup inputs for one stored image.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ImageInfoResponse {
    pub filename: String,
    #[schema(example = "/static/images/thumbnail/a.jpg 300w, /static/images/medium/a.jpg 800w, /static/images/large/a.jpg 1200w")]
    pub srcset: String,
    #[schema(example = "(max-width: 600px) 100vw, (max-width: 1200px) 50vw, 800px")]
    pub sizes: &'static str,
}
