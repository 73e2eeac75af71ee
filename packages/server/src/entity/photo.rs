use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An uploaded image. Every rendition is stored under the same `filename`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Canonical `<uuid hex>.<ext>` name; the de-duplication key.
    #[sea_orm(unique)]
    pub filename: String,
    pub description: Option<String>,

    #[sea_orm(has_many)]
    pub posts: HasMany<super::post::Entity>,

    #[sea_orm(has_many)]
    pub projects: HasMany<super::project::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
