pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod imaging;
pub mod mail;
pub mod media;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use common::BackendKind;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio API",
        version = "1.0.0",
        description = "Posts, projects and photos of a personal blog and portfolio"
    ),
    paths(handlers::image_info::image_info),
    tags(
        (name = "Auth", description = "Admin session"),
        (name = "Posts", description = "Posts, music items, videos and reviews"),
        (name = "Projects", description = "Portfolio projects and their items"),
        (name = "Photos", description = "Photo album"),
        (name = "Images", description = "Responsive image attributes"),
        (name = "Contact", description = "Contact form"),
        (name = "Flash", description = "One-shot status messages"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state.config.images))
        .split_for_parts();

    let config = state.config.clone();
    let serve_local = state.storage.kind() == BackendKind::Filesystem;

    let mut router = router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api));

    // Object-store renditions are fetched from the bucket's own URL.
    if serve_local {
        router = router
            .nest_service(
                &config.storage.url_prefix,
                ServeDir::new(&config.storage.root),
            )
            .layer(middleware::from_fn_with_state(
                config.storage.url_prefix.clone(),
                hide_dot_segments,
            ));
    }

    let router = router
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new());
    let cors = cors_layer(&config.server.cors);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// The storage root also holds the `.tmp` scratch directory, so any dot
/// segment below the static prefix answers 404.
async fn hide_dot_segments(
    State(prefix): State<String>,
    req: Request,
    next: Next,
) -> Response {
    let hidden = req
        .uri()
        .path()
        .strip_prefix(prefix.as_str())
        .is_some_and(|rest| {
            rest.split('/').any(|segment| {
                segment.starts_with('.') || segment.to_ascii_lowercase().starts_with("%2e")
            })
        });
    if hidden {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(req).await
}

/// Cross-origin access for a separately hosted front end. `None` when no
/// origin is configured.
fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static(utils::csrf::HEADER),
            ])
            .allow_credentials(true)
            .max_age(Duration::from_secs(config.max_age)),
    )
}
