use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::*;
use tracing::instrument;

use crate::database::with_read_retry;
use crate::entity::photo;
use crate::error::{AppError, ErrorBody};
use crate::imaging::SIZES_HINT;
use crate::models::photo::ImageInfoResponse;
use crate::state::AppState;

/// Responsive-image attributes for a stored photo. Any directory part of
/// the requested path is ignored.
#[utoipa::path(
    get,
    path = "/api/image-info/{filename}",
    tag = "Images",
    operation_id = "getImageInfo",
    summary = "Get srcset and sizes for an image",
    params(("filename" = String, Path, description = "Canonical photo filename")),
    responses(
        (status = 200, description = "Responsive image attributes", body = ImageInfoResponse),
        (status = 400, description = "Empty filename (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No such photo (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn image_info(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ImageInfoResponse>, AppError> {
    let filename = filename.rsplit('/').next().unwrap_or_default().trim();
    if filename.is_empty() {
        return Err(AppError::Validation("No filename provided".into()));
    }

    let photo = with_read_retry(|| {
        photo::Entity::find()
            .filter(photo::Column::Filename.eq(filename))
            .one(&state.db)
    })
    .await?
    .ok_or_else(|| AppError::NotFound("Image not found".into()))?;

    Ok(Json(ImageInfoResponse {
        srcset: state.images.build_descriptor(&photo.filename),
        filename: photo.filename,
        sizes: SIZES_HINT,
    }))
}
