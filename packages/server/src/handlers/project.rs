use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::database::with_read_retry;
use crate::entity::{post, project};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::form::{AppForm, CsrfForm, MultipartForm};
use crate::media::{CoverTarget, CoverUpload, admit_and_attach};
use crate::models::post::PostListItem;
use crate::models::project::{NewProject, ProjectDetailResponse, ProjectResponse};
use crate::state::AppState;
use crate::utils::csrf;
use crate::utils::flash::{self, Flash};

#[utoipa::path(
    get,
    path = "/",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "List projects, newest first",
    responses(
        (status = 200, description = "All projects", body = Vec<ProjectResponse>),
        (status = 503, description = "Database unavailable (SERVICE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let projects = with_read_retry(|| {
        project::Entity::find()
            .order_by_desc(project::Column::CreatedAt)
            .order_by_desc(project::Column::Id)
            .all(&state.db)
    })
    .await?;

    Ok(Json(
        projects
            .into_iter()
            .map(|p| ProjectResponse::new(p, &state.images))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Get a project with its items",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project details", body = ProjectDetailResponse),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Database unavailable (SERVICE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectDetailResponse>, AppError> {
    let project = with_read_retry(|| project::Entity::find_by_id(id).one(&state.db))
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

    let items = with_read_retry(|| {
        post::Entity::find()
            .filter(post::Column::ProjectId.eq(id))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&state.db)
    })
    .await?;

    Ok(Json(ProjectDetailResponse {
        project: ProjectResponse::new(project, &state.images),
        items: items
            .into_iter()
            .map(|p| PostListItem::new(p, &state.images))
            .collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Projects",
    operation_id = "createProject",
    summary = "Create a project",
    description = "Multipart form with `title`, optional `description`, `link` and `image`. \
        A cover that cannot be processed only produces a warning flash. Redirects to `/projects`.",
    request_body(content_type = "multipart/form-data", description = "Project fields, `csrf_token` and optional `image` file"),
    responses(
        (status = 303, description = "Created; redirect to `/projects`"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Bad CSRF token (CSRF_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, jar, form), fields(user_id = session.user_id))]
pub async fn create_project(
    session: AdminSession,
    State(state): State<AppState>,
    jar: CookieJar,
    mut form: MultipartForm,
) -> Result<(CookieJar, Redirect), AppError> {
    session.verify_csrf(form.text(csrf::FORM_FIELD))?;

    let new_project = NewProject::from_form(&form)?;
    let cover = CoverUpload::take(&mut form, "image")?;

    let project = project::ActiveModel {
        title: Set(new_project.title),
        description: Set(new_project.description),
        link: Set(new_project.link),
        image_filename: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;
    info!(project_id = project.id, "Project created");

    let mut messages = vec![Flash::success("Project created!")];
    if let Some(cover) = cover {
        messages.extend(admit_and_attach(&state, cover, CoverTarget::Project(project.id)).await?);
    }

    Ok((flash::push(jar, messages), Redirect::to("/projects")))
}

#[utoipa::path(
    post,
    path = "/{id}/delete",
    tag = "Projects",
    operation_id = "deleteProject",
    summary = "Delete a project and its items",
    description = "Deletes every item owned by the project in the same transaction. \
        Cover photos are kept. Redirects to `/projects`.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body(content = CsrfForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Deleted; redirect to `/projects`"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Bad CSRF token (CSRF_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, jar, form), fields(id))]
pub async fn delete_project(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: CookieJar,
    AppForm(form): AppForm<CsrfForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    session.verify_csrf(form.csrf_token.as_deref())?;

    let txn = state.db.begin().await?;

    project::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

    let items = post::Entity::delete_many()
        .filter(post::Column::ProjectId.eq(id))
        .exec(&txn)
        .await?;
    project::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    info!(project_id = id, items = items.rows_affected, "Project deleted");

    Ok((
        flash::push(jar, [Flash::success("Project deleted successfully!")]),
        Redirect::to("/projects"),
    ))
}
