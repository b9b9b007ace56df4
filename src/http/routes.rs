//! Axum router configuration

use axum::{
    extract::DefaultBodyLimit,
    http::header,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

use super::docs::ApiDoc;
use super::handlers::{decode, encode, health_check, not_found, root, transcode, version_check};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Conversion endpoints
        .route("/encode", post(encode))
        .route("/transcode", post(transcode))
        .route("/decode", post(decode))
        // Interactive documentation
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        // Middleware
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes()))
        .layer(TraceLayer::new_for_http());

    if state.config.cors_enabled {
        // Content-Disposition is exposed so browser clients can read the
        // suggested filename.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([header::CONTENT_DISPOSITION])
            .max_age(Duration::from_secs(3600));
        router = router.layer(cors);
    }

    router.with_state(state)
}
