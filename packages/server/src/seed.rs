use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::*;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::entity::user;
use crate::utils::hash;

/// Create the admin account from configuration if it does not exist yet.
///
/// An existing account is left alone, so changing `auth.admin_password`
/// later does not reset it.
pub async fn seed_admin(db: &DatabaseConnection, auth: &AuthConfig) -> Result<()> {
    let Some(password) = auth.admin_password.as_deref().filter(|p| !p.is_empty()) else {
        warn!("auth.admin_password is not set; no admin account will be created");
        return Ok(());
    };

    let username = auth.admin_username.trim();
    if username.is_empty() || username.chars().count() > 64 {
        anyhow::bail!("auth.admin_username must be 1-64 characters");
    }

    if user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let password_hash = hash::hash_password(password)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("failed to hash the admin password")?;
    let model = user::ActiveModel {
        username: Set(username.to_string()),
        password: Set(password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let result = user::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => info!(username, "Seeded admin account"),
        Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
