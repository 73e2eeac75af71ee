use axum::body::Bytes;
use chrono::Utc;
use common::Storage;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use tracing::{error, info, instrument, warn};

use crate::config::RenditionSpec;
use crate::entity::{photo, post, project};
use crate::error::AppError;
use crate::extractors::form::MultipartForm;
use crate::state::AppState;
use crate::utils::filename::canonical_filename;
use crate::utils::flash::Flash;

/// Row that receives a cover image once its photo exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverTarget {
    Post(i32),
    Project(i32),
}

/// An image file taken from a submission, already renamed to its canonical filename.
#[derive(Debug, Clone)]
pub struct CoverUpload {
    pub filename: String,
    pub bytes: Bytes,
}

impl CoverUpload {
    /// Take the file part `field` from `form`. A file with a disallowed
    /// extension is rejected here, before anything is written.
    pub fn take(form: &mut MultipartForm, field: &str) -> Result<Option<Self>, AppError> {
        let Some(file) = form.take_file(field) else {
            return Ok(None);
        };
        let filename = canonical_filename(&file.file_name).ok_or_else(|| {
            AppError::Validation("Images must be png, jpg, jpeg or gif files".into())
        })?;
        Ok(Some(Self {
            filename,
            bytes: file.bytes,
        }))
    }
}

async fn find_photo<C: ConnectionTrait>(db: &C, filename: &str) -> Result<Option<photo::Model>, DbErr> {
    photo::Entity::find()
        .filter(photo::Column::Filename.eq(filename))
        .one(db)
        .await
}

/// Resolve an upload to a stored photo.
///
/// A photo already registered under `canonical_filename` is reused and the
/// upload is not processed again. Otherwise the renditions are generated
/// and the row is inserted; concurrent admissions of the same filename all
/// end up with the one row that won. `None` means no rendition could be
/// stored and nothing was recorded.
#[instrument(skip(state, upload, description), fields(filename = %canonical_filename))]
pub async fn admit_cover(
    state: &AppState,
    upload: Bytes,
    canonical_filename: &str,
    description: Option<&str>,
) -> Result<Option<photo::Model>, AppError> {
    if let Some(existing) = find_photo(&state.db, canonical_filename).await? {
        info!(photo_id = existing.id, "Reusing existing photo");
        return Ok(Some(existing));
    }

    let renditions = match state.pipeline.process(upload, canonical_filename).await {
        Ok(set) if !set.is_empty() => set,
        Ok(_) => {
            warn!("No rendition could be stored");
            return Ok(None);
        }
        Err(e) => {
            warn!(error = %e, "Image processing failed");
            return Ok(None);
        }
    };

    let model = photo::ActiveModel {
        filename: Set(canonical_filename.to_string()),
        description: Set(description.map(str::to_string)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let inserted = photo::Entity::insert(model)
        .on_conflict(
            OnConflict::column(photo::Column::Filename)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await;

    match inserted {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => {
            delete_photo_files(&state.storage, state.pipeline.renditions(), canonical_filename)
                .await;
            return Err(e.into());
        }
    }

    let photo = find_photo(&state.db, canonical_filename)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Photo {canonical_filename} vanished after insert")))?;
    info!(photo_id = photo.id, renditions = renditions.len(), "Photo admitted");
    Ok(Some(photo))
}

/// Point `target` at the photo stored as `filename`.
#[instrument(skip(db))]
pub async fn attach_cover(
    db: &DatabaseConnection,
    target: CoverTarget,
    filename: &str,
) -> Result<(), AppError> {
    let txn = db.begin().await?;

    if find_photo(&txn, filename).await?.is_none() {
        return Err(AppError::NotFound(format!("Photo {filename} not found")));
    }

    let updated = match target {
        CoverTarget::Post(id) => {
            post::Entity::update_many()
                .col_expr(post::Column::ImageFilename, Expr::value(filename))
                .filter(post::Column::Id.eq(id))
                .exec(&txn)
                .await?
        }
        CoverTarget::Project(id) => {
            project::Entity::update_many()
                .col_expr(project::Column::ImageFilename, Expr::value(filename))
                .filter(project::Column::Id.eq(id))
                .exec(&txn)
                .await?
        }
    };
    if updated.rows_affected == 0 {
        return Err(AppError::NotFound(format!("{target:?} not found")));
    }

    txn.commit().await?;
    Ok(())
}

/// Admit `upload` and make it the cover of `target`.
///
/// The target row must already exist. Returns a warning to show the admin
/// when the image could not be stored; the target is left without a cover.
pub async fn admit_and_attach(
    state: &AppState,
    upload: CoverUpload,
    target: CoverTarget,
) -> Result<Option<Flash>, AppError> {
    match admit_cover(state, upload.bytes, &upload.filename, None).await? {
        Some(photo) => {
            attach_cover(&state.db, target, &photo.filename).await?;
            Ok(None)
        }
        None => Ok(Some(Flash::warning(
            "The image could not be processed and was not attached.",
        ))),
    }
}

/// Remove every rendition stored for `filename`. `false` if any removal failed.
pub async fn delete_photo_files(
    storage: &Storage,
    renditions: &[RenditionSpec],
    filename: &str,
) -> bool {
    let paths: Vec<String> = renditions
        .iter()
        .map(|spec| format!("{}/{filename}", spec.name))
        .collect();
    let deleted = storage.delete_many(&paths).await;
    if !deleted {
        error!(filename, "Some rendition files could not be deleted");
    }
    deleted
}
