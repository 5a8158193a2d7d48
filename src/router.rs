use admitdesk_observability::{logging_middleware, metrics_middleware};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::modules::admissions::init_admissions_router;
use crate::modules::classes::init_classes_router;
use crate::modules::feeds::init_feeds_router;
use crate::modules::ids::init_ids_router;
use crate::state::AppState;

/// Floor for the request body limit so JSON bodies are never squeezed by a
/// small upload limit.
const MIN_BODY_LIMIT: usize = 2 * 1024 * 1024;

pub fn init_router(state: AppState) -> Router {
    let body_limit = state.upload_config.max_bytes.max(MIN_BODY_LIMIT);
    let cors = cors_layer(&state);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .nest(
            "/api",
            Router::new()
                .nest("/admissions", init_admissions_router())
                .nest("/classes", init_classes_router())
                .nest("/ids", init_ids_router())
                .nest("/feeds", init_feeds_router()),
        )
        .nest_service("/files", ServeDir::new(&state.upload_config.dir))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if state.cors_config.allows_any() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics are disabled").into_response(),
    }
}
