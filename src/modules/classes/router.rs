use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_class_count, get_next_roll_number, list_classes};

pub fn init_classes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes))
        .route("/{class}/count", get(get_class_count))
        .route("/{class}/roll-number", get(get_next_roll_number))
}
