use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{generate_ids, generate_registration};

pub fn init_ids_router() -> Router<AppState> {
    Router::new()
        .route("/", get(generate_ids))
        .route("/registration", get(generate_registration))
}
