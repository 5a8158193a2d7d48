use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_admission, delete_admission, delete_document, get_admission, get_paginated_admissions,
    get_recent_admissions, get_stats, list_admissions, search_admissions, stream_admission,
    stream_admissions, update_status, upload_document,
};

pub fn init_admissions_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_admission).get(list_admissions))
        .route("/page", get(get_paginated_admissions))
        .route("/search", get(search_admissions))
        .route("/recent", get(get_recent_admissions))
        .route("/stats", get(get_stats))
        .route("/events", get(stream_admissions))
        .route("/{id}", get(get_admission).delete(delete_admission))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/events", get(stream_admission))
        .route(
            "/{id}/documents",
            post(upload_document).delete(delete_document),
        )
}
