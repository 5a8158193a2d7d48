//! Live subscriptions.
//!
//! A watcher reads its path once immediately, then again every time the
//! store reports a change at, above or below that path. Each read is handed
//! to the callback in store-delivered order until the returned
//! [`SubscriptionHandle`] is unsubscribed or dropped.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::StoreError;
use crate::{Child, RecordStore, path};

/// Keeps a subscription alive. Dropping it stops delivery.
#[derive(Debug)]
pub struct SubscriptionHandle {
    path: String,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn unsubscribe(self) {
        // Drop aborts the task.
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!(store.path = %self.path, "Subscription closed");
    }
}

/// Watches the direct children of `path`.
pub fn watch_children<F>(
    store: Arc<dyn RecordStore>,
    path: impl Into<String>,
    on_change: F,
) -> SubscriptionHandle
where
    F: FnMut(Result<Vec<Child>, StoreError>) + Send + 'static,
{
    spawn_watch(
        store,
        path.into(),
        |store, path| async move { store.children(&path).await },
        on_change,
    )
}

/// Watches the single node at `path`; `None` while it does not exist.
pub fn watch_node<F>(
    store: Arc<dyn RecordStore>,
    path: impl Into<String>,
    on_change: F,
) -> SubscriptionHandle
where
    F: FnMut(Result<Option<Value>, StoreError>) + Send + 'static,
{
    spawn_watch(
        store,
        path.into(),
        |store, path| async move { store.get_once(&path).await },
        on_change,
    )
}

fn spawn_watch<T, R, Fut, F>(
    store: Arc<dyn RecordStore>,
    watched: String,
    read: R,
    mut on_change: F,
) -> SubscriptionHandle
where
    T: Send + 'static,
    R: Fn(Arc<dyn RecordStore>, String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, StoreError>> + Send + 'static,
    F: FnMut(Result<T, StoreError>) + Send + 'static,
{
    // Subscribe before the first read so no write slips between the two.
    let mut changes = store.changes();
    let path = watched.clone();

    let task = tokio::spawn(async move {
        on_change(read(store.clone(), path.clone()).await);

        loop {
            match changes.recv().await {
                Ok(changed) if path::affects(&changed, &path) => {}
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(store.path = %path, skipped, "Subscription lagged, re-reading");
                }
                Err(RecvError::Closed) => break,
            }

            // Fold any burst of queued changes into a single re-read.
            loop {
                match changes.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }

            on_change(read(store.clone(), path.clone()).await);
        }
    });

    SubscriptionHandle {
        path: watched,
        task,
    }
}
