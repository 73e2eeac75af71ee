use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::project;
use crate::error::AppError;
use crate::extractors::form::MultipartForm;
use crate::imaging::ResponsiveImages;
use crate::models::post::PostListItem;
use crate::models::shared::{date_posted, validate_link, validate_title};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProjectResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Home weather station")]
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image_filename: Option<String>,
    pub srcset: String,
    #[schema(example = "2024-03-09")]
    pub date_posted: String,
    pub created_at: DateTime<Utc>,
}

impl ProjectResponse {
    pub fn new(project: project::Model, images: &ResponsiveImages) -> Self {
        Self {
            srcset: images.build_descriptor(project.image_filename.as_deref().unwrap_or_default()),
            date_posted: date_posted(&project.created_at),
            id: project.id,
            title: project.title,
            description: project.description,
            link: project.link,
            image_filename: project.image_filename,
            created_at: project.created_at,
        }
    }
}

/// A project together with the items it owns, newest first.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub items: Vec<PostListItem>,
}

/// A validated `POST /projects` submission, minus the cover upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
}

impl NewProject {
    pub fn from_form(form: &MultipartForm) -> Result<Self, AppError> {
        let title = form.text("title").unwrap_or_default();
        validate_title(title)?;
        let link = form.text("link");
        validate_link(link)?;

        Ok(Self {
            title: title.to_string(),
            description: form.raw("description").map(str::to_string),
            link: link.map(str::to_string),
        })
    }
}
