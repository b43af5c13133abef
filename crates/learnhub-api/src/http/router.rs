//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Skills
        .route(
            "/skills",
            get(handlers::skill::list_skills).post(handlers::skill::create_skill),
        )
        .route(
            "/skills/{id}",
            get(handlers::skill::get_skill)
                .put(handlers::skill::update_skill)
                .delete(handlers::skill::delete_skill),
        )
        .route("/skills/{id}/refresh", post(handlers::skill::refresh_skill))
        .route(
            "/skills/{id}/resources",
            get(handlers::skill::list_public_resources),
        )
        // Resources
        .route(
            "/resources",
            get(handlers::resource::list_resources).post(handlers::resource::create_resource),
        )
        .route(
            "/resources/bulk/delete",
            post(handlers::resource::bulk_delete),
        )
        .route(
            "/resources/bulk/active",
            post(handlers::resource::bulk_set_active),
        )
        .route(
            "/resources/{id}",
            get(handlers::resource::get_resource)
                .put(handlers::resource::update_resource)
                .delete(handlers::resource::delete_resource),
        )
        .route(
            "/resources/{id}/verify",
            post(handlers::resource::verify_resource),
        )
        .route("/resources/{id}/rate", post(handlers::resource::rate_resource))
        .route("/resources/{id}/move", post(handlers::resource::move_resource))
        // Trust
        .route("/verify-url", post(handlers::verify::verify_url))
        .route("/verify-all", post(handlers::verify::verify_all))
        // Dashboard stats
        .route("/stats", get(handlers::stats::get_stats));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
