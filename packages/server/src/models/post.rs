use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::post::{self, PostKind};
use crate::error::AppError;
use crate::extractors::form::MultipartForm;
use crate::imaging::ResponsiveImages;
use crate::models::content::{MusicDetails, PostBody, ReviewDetails, VideoDetails};
use crate::models::shared::{date_posted, truncate_content, validate_link, validate_title};
use crate::utils::markdown;

/// Posts per page on the front page.
pub const PER_PAGE: u64 = 5;
/// Characters of body text shown in listings.
pub const EXCERPT_CHARS: usize = 300;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListQuery {
    /// Page number (1-based, default 1).
    #[param(example = 1, minimum = 1)]
    pub page: Option<u64>,
}

impl PostListQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Rows to skip for this page. Pages past any possible row count
    /// saturate instead of overflowing, and read as empty.
    pub fn offset(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(PER_PAGE)
            .min(i64::MAX as u64)
    }
}

/// One entry of a post listing.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PostListItem {
    #[schema(example = 7)]
    pub id: i32,
    pub kind: PostKind,
    #[schema(example = "Launch")]
    pub title: String,
    /// First 300 characters of the body, with `...` when cut.
    pub content: String,
    #[schema(example = "2024-03-09")]
    pub date_posted: String,
    pub image_filename: Option<String>,
    pub link: Option<String>,
    /// Responsive `srcset`; empty without a cover image.
    pub srcset: String,
}

impl PostListItem {
    pub fn new(post: post::Model, images: &ResponsiveImages) -> Self {
        let srcset = images.build_descriptor(post.image_filename.as_deref().unwrap_or_default());
        Self {
            id: post.id,
            kind: post.kind,
            title: post.title,
            content: markdown::excerpt(post.content.as_deref().unwrap_or_default(), EXCERPT_CHARS),
            date_posted: date_posted(&post.created_at),
            image_filename: post.image_filename,
            link: post.link,
            srcset,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostListResponse {
    pub posts: Vec<PostListItem>,
    #[schema(example = 2)]
    pub page: u64,
    /// Whether a further page exists.
    pub has_next: bool,
}

/// A single post with its kind-specific payload.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PostResponse {
    pub id: i32,
    pub kind: PostKind,
    pub title: String,
    /// Markdown source.
    pub content: Option<String>,
    /// Rendered body with raw HTML removed.
    pub content_html: String,
    pub date_posted: String,
    pub created_at: DateTime<Utc>,
    pub link: Option<String>,
    pub image_filename: Option<String>,
    pub project_id: Option<i32>,
    pub srcset: String,
    pub body: PostBody,
}

impl PostResponse {
    pub fn new(post: post::Model, images: &ResponsiveImages) -> Result<Self, AppError> {
        let body = PostBody::from_columns(post.kind, post.details.as_ref()).map_err(|e| {
            AppError::Internal(format!("Post {} has an inconsistent payload: {e}", post.id))
        })?;
        Ok(Self {
            id: post.id,
            kind: post.kind,
            content_html: markdown::render(post.content.as_deref().unwrap_or_default()),
            date_posted: date_posted(&post.created_at),
            srcset: images.build_descriptor(post.image_filename.as_deref().unwrap_or_default()),
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            link: post.link,
            image_filename: post.image_filename,
            project_id: post.project_id,
            body,
        })
    }
}

/// A validated `POST /posts` submission, minus the cover upload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub content: Option<String>,
    pub link: Option<String>,
    pub project_id: Option<i32>,
    pub body: PostBody,
}

impl NewPost {
    /// Read the shared fields plus whichever payload fields `kind` selects.
    /// Fields belonging to other kinds are ignored.
    pub fn from_form(form: &MultipartForm) -> Result<Self, AppError> {
        let title = form.text("title").unwrap_or_default();
        validate_title(title)?;
        let link = form.text("link");
        validate_link(link)?;

        Ok(Self {
            title: title.to_string(),
            content: form.raw("content").map(truncate_content),
            link: link.map(str::to_string),
            project_id: form.parse("project_id")?,
            body: body_from_form(form)?,
        })
    }
}

fn body_from_form(form: &MultipartForm) -> Result<PostBody, AppError> {
    let kind = match form.text("kind") {
        None => PostKind::Post,
        Some(name) => PostKind::from_name(name)
            .ok_or_else(|| AppError::Validation(format!("Unknown post kind '{name}'")))?,
    };
    let text = |name: &str| form.text(name).map(str::to_string);
    let url = |name: &str| -> Result<Option<String>, AppError> {
        let value = form.text(name);
        validate_link(value).map_err(|_| {
            AppError::Validation(format!("Field '{name}' must be at most 255 characters"))
        })?;
        Ok(value.map(str::to_string))
    };

    let body = match kind {
        PostKind::Post => PostBody::Post,
        PostKind::Music => PostBody::Music(MusicDetails {
            item_type: text("item_type"),
            artist: text("artist"),
            album_title: text("album_title"),
            spotify_url: url("spotify_url")?,
            apple_music_url: url("apple_music_url")?,
        }),
        PostKind::Video => PostBody::Video(VideoDetails {
            video_url: url("video_url")?,
            embed_code: form.raw("embed_code").map(str::to_string),
            source_type: text("source_type"),
            duration: text("duration"),
        }),
        PostKind::Review => PostBody::Review(ReviewDetails {
            item_title: text("item_title").unwrap_or_default(),
            category: text("category"),
            rating: form
                .parse("rating")?
                .ok_or_else(|| AppError::Validation("Rating is required".into()))?,
            release_year: form.parse("release_year")?,
            creator: text("creator"),
            item_link: url("item_link")?,
        }),
    };

    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(body)
}
