use admitdesk_core::AppError;
use admitdesk_core::clock::now_millis;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{KeepAliveStream, Sse},
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::modules::feeds::badge::{Badge, badge_label, time_ago};
use crate::modules::feeds::model::{FeedName, KeyedFeedEntry, PublishFeedEntryDto};
use crate::sse::{SubscriptionStream, emit, json_event, repo_error_event, subscription_stream};
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntryView {
    #[serde(flatten)]
    pub entry: KeyedFeedEntry,
    pub time_ago: String,
}

#[derive(Debug, Serialize)]
pub struct FeedSnapshotResponse {
    pub feed: &'static str,
    pub total: usize,
    pub badge: String,
    pub entries: Vec<FeedEntryView>,
}

/// Pushed on every change of a streamed feed.
#[derive(Debug, Serialize)]
pub struct FeedEvent {
    pub feed: &'static str,
    pub badge: String,
    /// The feed grew since the last non-empty snapshot on this connection.
    pub alert: bool,
    pub entries: Vec<FeedEntryView>,
}

fn entry_views(entries: Vec<KeyedFeedEntry>, now: i64) -> Vec<FeedEntryView> {
    entries
        .into_iter()
        .map(|entry| FeedEntryView {
            time_ago: time_ago(entry.entry.time, now),
            entry,
        })
        .collect()
}

/// Current feed, newest first, with display labels.
#[instrument(skip(state))]
pub async fn get_feed(
    State(state): State<AppState>,
    Path(feed): Path<String>,
) -> Result<Json<FeedSnapshotResponse>, AppError> {
    let feed: FeedName = feed.parse()?;
    let entries = state.feeds.snapshot(feed).await?;

    let total = entries.len();
    Ok(Json(FeedSnapshotResponse {
        feed: feed.slug(),
        total,
        badge: badge_label(total),
        entries: entry_views(entries, now_millis()),
    }))
}

/// Streams `feed` events, the current snapshot first. Each connection keeps
/// its own badge.
#[instrument(skip(state))]
pub async fn stream_feed(
    State(state): State<AppState>,
    Path(feed): Path<String>,
) -> Result<Sse<KeepAliveStream<SubscriptionStream>>, AppError> {
    let feed: FeedName = feed.parse()?;
    info!(feed = %feed, "Feed stream opened");

    subscription_stream(|tx| {
        let mut badge = Badge::new();
        Ok(state.feeds.subscribe(feed, move |snapshot| {
            let event = match snapshot {
                Ok(entries) => {
                    let update = badge.observe(entries.len());
                    json_event(
                        "feed",
                        &FeedEvent {
                            feed: feed.slug(),
                            badge: update.label,
                            alert: update.alert,
                            entries: entry_views(entries, now_millis()),
                        },
                    )
                }
                Err(e) => repo_error_event(&e),
            };
            emit(&tx, event);
        }))
    })
}

#[instrument(skip(state, dto))]
pub async fn publish_entry(
    State(state): State<AppState>,
    Path(feed): Path<String>,
    ValidatedJson(dto): ValidatedJson<PublishFeedEntryDto>,
) -> Result<(StatusCode, Json<KeyedFeedEntry>), AppError> {
    let feed: FeedName = feed.parse()?;
    let published = state.feeds.publish(feed, dto).await?;
    Ok((StatusCode::CREATED, Json(published)))
}

#[instrument(skip(state))]
pub async fn clear_feed(
    State(state): State<AppState>,
    Path(feed): Path<String>,
) -> Result<StatusCode, AppError> {
    let feed: FeedName = feed.parse()?;
    state.feeds.clear(feed).await?;
    Ok(StatusCode::NO_CONTENT)
}
