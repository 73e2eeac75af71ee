use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::{info, instrument, warn};

use crate::database::with_read_retry;
use crate::entity::{photo, post, project};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::form::{AppForm, CsrfForm, MultipartForm};
use crate::media::{CoverUpload, admit_cover, delete_photo_files};
use crate::models::photo::PhotoResponse;
use crate::models::shared::validate_description;
use crate::state::AppState;
use crate::utils::csrf;
use crate::utils::flash::{self, Flash};

#[utoipa::path(
    get,
    path = "/",
    tag = "Photos",
    operation_id = "listPhotos",
    summary = "List the photo album, newest first",
    responses(
        (status = 200, description = "All photos", body = Vec<PhotoResponse>),
        (status = 503, description = "Database unavailable (SERVICE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_photos(
    State(state): State<AppState>,
) -> Result<Json<Vec<PhotoResponse>>, AppError> {
    let photos = with_read_retry(|| {
        photo::Entity::find()
            .order_by_desc(photo::Column::CreatedAt)
            .order_by_desc(photo::Column::Id)
            .all(&state.db)
    })
    .await?;

    Ok(Json(
        photos
            .into_iter()
            .map(|p| PhotoResponse::new(p, &state.images))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Photos",
    operation_id = "uploadPhoto",
    summary = "Upload a photo to the album",
    description = "Multipart form with a required `image` file and optional `description`. \
        Redirects to `/photo_album`; an image that cannot be processed is reported as an error flash.",
    request_body(content_type = "multipart/form-data", description = "`image` file, optional `description`, `csrf_token`"),
    responses(
        (status = 303, description = "Processed; redirect to `/photo_album`"),
        (status = 400, description = "Missing or disallowed image (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Bad CSRF token (CSRF_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, jar, form), fields(user_id = session.user_id))]
pub async fn upload_photo(
    session: AdminSession,
    State(state): State<AppState>,
    jar: CookieJar,
    mut form: MultipartForm,
) -> Result<(CookieJar, Redirect), AppError> {
    session.verify_csrf(form.text(csrf::FORM_FIELD))?;

    let description = form.text("description").map(str::to_string);
    validate_description(description.as_deref())?;
    let upload = CoverUpload::take(&mut form, "image")?
        .ok_or_else(|| AppError::Validation("A photo is required".into()))?;

    let message = match admit_cover(&state, upload.bytes, &upload.filename, description.as_deref())
        .await?
    {
        Some(photo) => {
            info!(photo_id = photo.id, "Photo uploaded");
            Flash::success("Photo uploaded successfully!")
        }
        None => Flash::error("The photo could not be processed."),
    };

    Ok((flash::push(jar, [message]), Redirect::to("/photo_album")))
}

#[utoipa::path(
    post,
    path = "/{id}/delete",
    tag = "Photos",
    operation_id = "deletePhoto",
    summary = "Delete a photo and its files",
    description = "Removes every stored rendition, clears the photo from any post or project \
        using it as a cover, then deletes the row. Files that could not be removed are reported \
        as a warning flash. Redirects to `/photo_album`.",
    params(("id" = i32, Path, description = "Photo ID")),
    request_body(content = CsrfForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Deleted; redirect to `/photo_album`"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Bad CSRF token (CSRF_INVALID)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, jar, form), fields(id))]
pub async fn delete_photo(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: CookieJar,
    AppForm(form): AppForm<CsrfForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    session.verify_csrf(form.csrf_token.as_deref())?;

    let photo = photo::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".into()))?;

    let mut messages = Vec::new();
    if !delete_photo_files(&state.storage, state.pipeline.renditions(), &photo.filename).await {
        warn!(filename = %photo.filename, "Deleting photo with leftover files");
        messages.push(Flash::warning("Some image files could not be deleted."));
    }

    let txn = state.db.begin().await?;

    let no_cover = Expr::value(Option::<String>::None);
    post::Entity::update_many()
        .col_expr(post::Column::ImageFilename, no_cover.clone())
        .filter(post::Column::ImageFilename.eq(photo.filename.as_str()))
        .exec(&txn)
        .await?;
    project::Entity::update_many()
        .col_expr(project::Column::ImageFilename, no_cover)
        .filter(project::Column::ImageFilename.eq(photo.filename.as_str()))
        .exec(&txn)
        .await?;
    photo::Entity::delete_by_id(photo.id).exec(&txn).await?;

    txn.commit().await?;
    info!(photo_id = photo.id, "Photo deleted");

    messages.push(Flash::success("Photo deleted successfully!"));
    Ok((flash::push(jar, messages), Redirect::to("/photo_album")))
}
