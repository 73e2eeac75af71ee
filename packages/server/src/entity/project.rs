use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub link: Option<String>,

    /// Cover photo. NULL until admission succeeds, and again after the photo is deleted.
    pub image_filename: Option<String>,
    #[sea_orm(belongs_to, from = "image_filename", to = "filename")]
    pub cover: HasOne<super::photo::Entity>,

    /// Owned items, deleted together with the project.
    #[sea_orm(has_many)]
    pub items: HasMany<super::post::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
