//! Notice board feeds.
//!
//! Entries are appended with store-assigned keys that sort in insertion
//! order, so reversing the children of a feed yields newest first.

use std::sync::Arc;
use std::time::Duration;

use admitdesk_core::RepoError;
use admitdesk_core::clock::now_millis;
use admitdesk_store::{Child, RecordStore, StoreError, SubscriptionHandle, bounded, watch_children};
use tracing::{info, instrument, warn};

use super::model::{FeedEntry, FeedName, KeyedFeedEntry, PublishFeedEntryDto};

#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl std::fmt::Debug for FeedService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedService")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl FeedService {
    pub fn new(store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Current entries, newest first. An empty feed is an empty list.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, feed: FeedName) -> Result<Vec<KeyedFeedEntry>, RepoError> {
        let children = bounded(self.timeout, self.store.children(feed.path())).await?;
        Ok(newest_first(feed, children))
    }

    #[instrument(skip(self, dto), fields(feed = %feed))]
    pub async fn publish(
        &self,
        feed: FeedName,
        dto: PublishFeedEntryDto,
    ) -> Result<KeyedFeedEntry, RepoError> {
        let entry = FeedEntry {
            text: dto.text,
            time: dto.time.unwrap_or_else(now_millis),
            kind: dto.kind,
        };

        let value = serde_json::to_value(&entry)?;
        let key = bounded(self.timeout, self.store.push(feed.path(), value)).await?;

        info!(feed = %feed, key = %key, "Feed entry published");
        Ok(KeyedFeedEntry { key, entry })
    }

    /// Removes every entry of `feed`.
    #[instrument(skip(self))]
    pub async fn clear(&self, feed: FeedName) -> Result<(), RepoError> {
        bounded(self.timeout, self.store.delete(feed.path())).await?;
        info!(feed = %feed, "Feed cleared");
        Ok(())
    }

    /// Delivers the full feed, newest first, now and after every change until
    /// the handle is dropped or unsubscribed.
    pub fn subscribe<F>(&self, feed: FeedName, mut on_change: F) -> SubscriptionHandle
    where
        F: FnMut(Result<Vec<KeyedFeedEntry>, RepoError>) + Send + 'static,
    {
        watch_children(
            self.store.clone(),
            feed.path(),
            move |snapshot: Result<Vec<Child>, StoreError>| {
                on_change(
                    snapshot
                        .map_err(RepoError::from)
                        .map(|children| newest_first(feed, children)),
                )
            },
        )
    }
}

fn newest_first(feed: FeedName, children: Vec<Child>) -> Vec<KeyedFeedEntry> {
    children
        .into_iter()
        .rev()
        .filter_map(|Child { key, value }| match serde_json::from_value(value) {
            Ok(entry) => Some(KeyedFeedEntry { key, entry }),
            Err(e) => {
                warn!(feed = %feed, key = %key, error = %e, "Skipping malformed feed entry");
                None
            }
        })
        .collect()
}
