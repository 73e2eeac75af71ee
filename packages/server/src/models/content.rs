//! The polymorphic payload carried by a `post` row.
//!
//! A row stores `kind` plus an optional JSON `details` column. [`PostBody`]
//! is the only way in or out of those two columns, so a payload can never
//! disagree with its discriminator.

use sea_orm::prelude::Json;
use serde::{Deserialize, Serialize};

use crate::entity::post::PostKind;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("{kind} items require a details payload")]
    MissingPayload { kind: &'static str },
    #[error("plain posts carry no details payload")]
    UnexpectedPayload,
    #[error("malformed {kind} details: {reason}")]
    Malformed { kind: &'static str, reason: String },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MusicDetails {
    /// Album, track or playlist.
    #[schema(example = "album")]
    pub item_type: Option<String>,
    pub artist: Option<String>,
    pub album_title: Option<String>,
    pub spotify_url: Option<String>,
    pub apple_music_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VideoDetails {
    pub video_url: Option<String>,
    /// Raw embed markup, rendered as-is by the front end.
    pub embed_code: Option<String>,
    #[schema(example = "youtube")]
    pub source_type: Option<String>,
    #[schema(example = "12:34")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ReviewDetails {
    pub item_title: String,
    #[schema(example = "book")]
    pub category: Option<String>,
    /// 1 to 5 inclusive.
    #[schema(example = 4, minimum = 1, maximum = 5)]
    pub rating: i16,
    pub release_year: Option<i32>,
    /// Author, director or artist.
    pub creator: Option<String>,
    pub item_link: Option<String>,
}

/// Kind-tagged content payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PostBody {
    Post,
    Music(MusicDetails),
    Video(VideoDetails),
    Review(ReviewDetails),
}

impl PostBody {
    pub fn kind(&self) -> PostKind {
        match self {
            PostBody::Post => PostKind::Post,
            PostBody::Music(_) => PostKind::Music,
            PostBody::Video(_) => PostKind::Video,
            PostBody::Review(_) => PostKind::Review,
        }
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        match self {
            PostBody::Review(review) => {
                if review.item_title.trim().is_empty() || review.item_title.chars().count() > 200 {
                    return Err(ContentError::Invalid(
                        "Reviewed item title must be 1-200 characters".into(),
                    ));
                }
                if !(1..=5).contains(&review.rating) {
                    return Err(ContentError::Invalid("Rating must be between 1 and 5".into()));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Split into the `(kind, details)` column pair.
    pub fn into_columns(self) -> (PostKind, Option<Json>) {
        let kind = self.kind();
        let details = match self {
            PostBody::Post => None,
            PostBody::Music(d) => serde_json::to_value(d).ok(),
            PostBody::Video(d) => serde_json::to_value(d).ok(),
            PostBody::Review(d) => serde_json::to_value(d).ok(),
        };
        (kind, details)
    }

    /// Rebuild from the `(kind, details)` column pair.
    pub fn from_columns(kind: PostKind, details: Option<&Json>) -> Result<Self, ContentError> {
        let label = kind.as_str();
        let payload = match (kind, details) {
            (PostKind::Post, None) => return Ok(PostBody::Post),
            (PostKind::Post, Some(Json::Null)) => return Ok(PostBody::Post),
            (PostKind::Post, Some(_)) => return Err(ContentError::UnexpectedPayload),
            (_, None) | (_, Some(Json::Null)) => {
                return Err(ContentError::MissingPayload { kind: label });
            }
            (_, Some(value)) => value.clone(),
        };

        let malformed = |e: serde_json::Error| ContentError::Malformed {
            kind: label,
            reason: e.to_string(),
        };
        Ok(match kind {
            PostKind::Music => PostBody::Music(serde_json::from_value(payload).map_err(malformed)?),
            PostKind::Video => PostBody::Video(serde_json::from_value(payload).map_err(malformed)?),
            PostKind::Review => {
                PostBody::Review(serde_json::from_value(payload).map_err(malformed)?)
            }
            PostKind::Post => PostBody::Post,
        })
    }
}
