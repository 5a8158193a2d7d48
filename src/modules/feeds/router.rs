use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{clear_feed, get_feed, publish_entry, stream_feed};

pub fn init_feeds_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{feed}",
            get(get_feed).post(publish_entry).delete(clear_feed),
        )
        .route("/{feed}/events", get(stream_feed))
}
