//! # admitdesk Store
//!
//! A small path-addressed document store abstraction, modelled on realtime
//! tree databases: every record lives at a slash-separated path such as
//! `admissions/ADM251234` or `notice/new/00000000000000000007`.
//!
//! Two backends implement [`RecordStore`]:
//!
//! - [`MemoryStore`]: process-local, used by tests and single-node setups
//! - [`PgStore`]: PostgreSQL, one JSONB row per node
//!
//! Subscriptions are built on top of the store-wide change stream
//! ([`RecordStore::changes`]) by [`watch_children`] and [`watch_node`].
//!
//! # Example
//!
//! ```ignore
//! use admitdesk_store::{MemoryStore, RecordStore};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.put("classCounts/LKG", json!(4)).await?;
//! let next = store.increment("classCounts/LKG", 1).await?;
//! assert_eq!(next, 5);
//! ```

pub mod error;
pub mod memory;
pub mod ordering;
pub mod path;
pub mod postgres;
pub mod timeout;
pub mod watch;

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use tokio::sync::broadcast;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use timeout::bounded;
pub use watch::{SubscriptionHandle, watch_children, watch_node};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// A direct child of a path: its last path segment and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub key: String,
    pub value: Value,
}

impl Child {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Abstract storage collaborator.
///
/// Children are always returned in ascending key order. Keys produced by
/// [`RecordStore::push`] sort in insertion order.
pub trait RecordStore: Send + Sync {
    /// Full overwrite write.
    fn put<'a>(&'a self, path: &'a str, value: Value) -> StoreFuture<'a, ()>;

    /// Shallow merge of `partial` into the object at `path`.
    ///
    /// Returns `false` without writing anything when no node exists at `path`.
    fn patch<'a>(&'a self, path: &'a str, partial: Map<String, Value>) -> StoreFuture<'a, bool>;

    fn get_once<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Option<Value>>;

    /// Direct children of `path`.
    fn children<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Vec<Child>>;

    /// Children whose object field `field` equals `value`.
    fn query_equal<'a>(
        &'a self,
        path: &'a str,
        field: &'a str,
        value: &'a Value,
    ) -> StoreFuture<'a, Vec<Child>> {
        Box::pin(async move {
            Ok(self
                .children(path)
                .await?
                .into_iter()
                .filter(|child| child.value.get(field) == Some(value))
                .collect())
        })
    }

    /// The `n` children with the greatest `field`, in ascending `field` order.
    fn query_ordered_limit_last<'a>(
        &'a self,
        path: &'a str,
        field: &'a str,
        n: usize,
    ) -> StoreFuture<'a, Vec<Child>> {
        Box::pin(async move {
            let mut children = self.children(path).await?;
            ordering::sort_by_field(&mut children, field);
            let skip = children.len().saturating_sub(n);
            Ok(children.split_off(skip))
        })
    }

    /// Removes `path` and everything beneath it. Absent paths are not an error.
    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()>;

    /// Appends `value` under `path` with a store-assigned key and returns the key.
    fn push<'a>(&'a self, path: &'a str, value: Value) -> StoreFuture<'a, String>;

    /// Atomically adds `delta` to the integer at `path` (absent counts as 0)
    /// and returns the new value.
    fn increment<'a>(&'a self, path: &'a str, delta: i64) -> StoreFuture<'a, i64>;

    /// Stream of paths written or deleted after the call.
    fn changes(&self) -> broadcast::Receiver<String>;
}
