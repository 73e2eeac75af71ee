use axum::{
    Json,
    extract::{Path, Query, State},
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
use crate::models::post::{
    NewPost, PER_PAGE, PostListItem, PostListQuery, PostListResponse, PostResponse,
};
use crate::state::AppState;
use crate::utils::csrf;
use crate::utils::flash::{self, Flash};

#[utoipa::path(
    get,
    path = "/",
    tag = "Posts",
    operation_id = "listPosts",
    summary = "List posts, newest first",
    description = "Five posts per page. Bodies are cut to 300 characters.",
    params(PostListQuery),
    responses(
        (status = 200, description = "One page of posts", body = PostListResponse),
        (status = 503, description = "Database unavailable (SERVICE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let page = query.page();
    let offset = query.offset();

    // One extra row tells whether a next page exists.
    let mut posts = with_read_retry(|| {
        post::Entity::find()
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(PER_PAGE + 1)
            .all(&state.db)
    })
    .await?;

    let has_next = posts.len() as u64 > PER_PAGE;
    posts.truncate(PER_PAGE as usize);

    Ok(Json(PostListResponse {
        posts: posts
            .into_iter()
            .map(|p| PostListItem::new(p, &state.images))
            .collect(),
        page,
        has_next,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Posts",
    operation_id = "getPost",
    summary = "Get a post by ID",
    description = "Returns the post with its kind-specific payload and the body rendered from Markdown.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details", body = PostResponse),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Database unavailable (SERVICE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, AppError> {
    let post = with_read_retry(|| post::Entity::find_by_id(id).one(&state.db))
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    Ok(Json(PostResponse::new(post, &state.images)?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Posts",
    operation_id = "createPost",
    summary = "Create a post, music item, video or review",
    description = "Multipart form. `kind` selects the payload fields (`post` when absent). \
        An optional `image` file becomes the cover; if it cannot be processed the post is still \
        created and a warning flash is queued. Redirects to `/`.",
    request_body(content_type = "multipart/form-data", description = "Post fields, `csrf_token` and optional `image` file"),
    responses(
        (status = 303, description = "Created; redirect to `/`"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Bad CSRF token (CSRF_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, jar, form), fields(user_id = session.user_id))]
pub async fn create_post(
    session: AdminSession,
    State(state): State<AppState>,
    jar: CookieJar,
    mut form: MultipartForm,
) -> Result<(CookieJar, Redirect), AppError> {
    session.verify_csrf(form.text(csrf::FORM_FIELD))?;

    let new_post = NewPost::from_form(&form)?;
    let cover = CoverUpload::take(&mut form, "image")?;

    if let Some(project_id) = new_post.project_id
        && project::Entity::find_by_id(project_id)
            .one(&state.db)
            .await?
            .is_none()
    {
        return Err(AppError::Validation(format!("Project {project_id} does not exist")));
    }

    let (kind, details) = new_post.body.into_columns();
    let post = post::ActiveModel {
        kind: Set(kind),
        title: Set(new_post.title),
        content: Set(new_post.content),
        details: Set(details),
        link: Set(new_post.link),
        image_filename: Set(None),
        project_id: Set(new_post.project_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;
    info!(post_id = post.id, kind = kind.as_str(), "Post created");

    let mut messages = vec![Flash::success("Your post has been created!")];
    if let Some(cover) = cover {
        messages.extend(admit_and_attach(&state, cover, CoverTarget::Post(post.id)).await?);
    }

    Ok((flash::push(jar, messages), Redirect::to("/")))
}

#[utoipa::path(
    post,
    path = "/{id}/delete",
    tag = "Posts",
    operation_id = "deletePost",
    summary = "Delete a post",
    description = "The cover photo is kept. Redirects to `/`.",
    params(("id" = i32, Path, description = "Post ID")),
    request_body(content = CsrfForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Deleted; redirect to `/`"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Bad CSRF token (CSRF_INVALID)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, jar, form), fields(id))]
pub async fn delete_post(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: CookieJar,
    AppForm(form): AppForm<CsrfForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    session.verify_csrf(form.csrf_token.as_deref())?;

    let result = post::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Post not found".into()));
    }
    info!(post_id = id, "Post deleted");

    Ok((
        flash::push(jar, [Flash::success("Post deleted successfully!")]),
        Redirect::to("/"),
    ))
}
