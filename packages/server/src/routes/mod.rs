use axum::{extract::DefaultBodyLimit, routing::get};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::ImageConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(images: &ImageConfig) -> OpenApiRouter<AppState> {
    let upload_limit = DefaultBodyLimit::max(images.max_upload_bytes);

    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/posts", post_routes().layer(upload_limit))
        .nest("/projects", project_routes().layer(upload_limit))
        .nest("/photos", photo_routes().layer(upload_limit))
        .nest("/contact", OpenApiRouter::new().routes(routes!(handlers::contact::send_message)))
        .nest("/flash", OpenApiRouter::new().routes(routes!(handlers::flash::take_flash)))
        // Documented on `ApiDoc`; the catch-all segment has no OpenAPI form.
        .route("/image-info/{*filename}", get(handlers::image_info::image_info))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
}

fn post_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::post::list_posts, handlers::post::create_post))
        .routes(routes!(handlers::post::get_post))
        .routes(routes!(handlers::post::delete_post))
}

fn project_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::project::list_projects,
            handlers::project::create_project
        ))
        .routes(routes!(handlers::project::get_project))
        .routes(routes!(handlers::project::delete_project))
}

fn photo_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::photo::list_photos, handlers::photo::upload_photo))
        .routes(routes!(handlers::photo::delete_photo))
}
