//! Axum router construction.
//!
//! Builds the full application router with the banner routes, public
//! health/docs endpoints, middleware layers, and static serving of uploads.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Extra request body allowance on top of `uploads.max_bytes` for multipart
/// framing, so files just over the limit still reach size validation.
const UPLOAD_BODY_SLACK: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::banners::list_banners,
        routes::banners::create_banner,
        routes::banners::delete_banner,
        routes::banners::edit_banner,
        routes::banners::upload_banner_image,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::banners::BannerResponse,
        routes::banners::EditBannerForm,
        routes::banners::UploadResponse,
        routes::banners::UploadErrorResponse,
    ))
)]
pub struct ApiDoc;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = usize::try_from(ctx.config.uploads.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(UPLOAD_BODY_SLACK);

    // Protected banner routes.
    let protected_routes = Router::new()
        .route(
            "/banners",
            get(routes::banners::list_banners).post(routes::banners::create_banner),
        )
        .route("/banners/{id}", delete(routes::banners::delete_banner))
        .route("/banners/{id}/edit", post(routes::banners::edit_banner))
        .route(
            "/banners/{id}/upload",
            post(routes::banners::upload_banner_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    let public_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api-docs/openapi.json", get(openapi_json));

    let app = Router::new().merge(protected_routes).merge(public_routes);

    // Stored uploads are served under the same base the API reports paths with.
    let uploads = ServeDir::new(&ctx.config.uploads.dir);
    let base = ctx.config.uploads.public_base.trim_matches('/').to_string();
    let app = if base.is_empty() {
        app.fallback_service(uploads)
    } else {
        app.nest_service(&format!("/{base}"), uploads)
    };

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(ctx)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
