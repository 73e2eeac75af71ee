use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Discriminator for the polymorphic content row.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "music")]
    Music,
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "review")]
    Review,
}

impl PostKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PostKind::Post => "post",
            PostKind::Music => "music",
            PostKind::Video => "video",
            PostKind::Review => "review",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "post" => Some(PostKind::Post),
            "music" => Some(PostKind::Music),
            "video" => Some(PostKind::Video),
            "review" => Some(PostKind::Review),
            _ => None,
        }
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub kind: PostKind,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>, // in Markdown
    /// Kind-specific payload; see `models::content::PostBody`.
    #[sea_orm(column_type = "Json", nullable)]
    pub details: Option<Json>,
    pub link: Option<String>,

    pub image_filename: Option<String>,
    #[sea_orm(belongs_to, from = "image_filename", to = "filename")]
    pub cover: HasOne<super::photo::Entity>,

    pub project_id: Option<i32>,
    #[sea_orm(belongs_to, from = "project_id", to = "id")]
    pub project: HasOne<super::project::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
