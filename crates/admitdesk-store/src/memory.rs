//! In-process record store.
//!
//! Nodes live in a `BTreeMap` keyed by full path behind a single mutex, which
//! makes every operation (including [`RecordStore::increment`]) atomic with
//! respect to the others. The lock is never held across an `.await`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::StoreError;
use crate::{Child, RecordStore, StoreFuture, path};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<String, Value>,
    push_seq: u64,
    offline: bool,
    closed: bool,
}

#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    changes: broadcast::Sender<String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(Inner::default()),
            changes,
        }
    }

    /// Simulates a backend outage: while offline every operation fails with
    /// [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.offline = offline;
        }
    }

    /// Shuts the store down. Later operations fail with [`StoreError::Closed`].
    pub fn close(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.closed = true;
        }
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.nodes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        if inner.closed {
            return Err(StoreError::Closed);
        }
        if inner.offline {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(inner)
    }

    fn notify(&self, path: &str) {
        // no receivers is fine
        let _ = self.changes.send(path.to_string());
    }

    fn collect_children(nodes: &BTreeMap<String, Value>, parent: &str) -> Vec<Child> {
        let prefix = format!("{parent}/");
        nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, value)| {
                let rest = &key[prefix.len()..];
                (!rest.contains('/')).then(|| Child::new(rest, value.clone()))
            })
            .collect()
    }
}

impl RecordStore for MemoryStore {
    fn put<'a>(&'a self, path: &'a str, value: Value) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            path::validate(path)?;
            self.lock()?.nodes.insert(path.to_string(), value);
            self.notify(path);
            Ok(())
        })
    }

    fn patch<'a>(&'a self, path: &'a str, partial: Map<String, Value>) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            path::validate(path)?;
            {
                let mut inner = self.lock()?;
                let Some(existing) = inner.nodes.get_mut(path) else {
                    return Ok(false);
                };
                match existing {
                    Value::Object(fields) => fields.extend(partial),
                    other => *other = Value::Object(partial),
                }
            }
            self.notify(path);
            Ok(true)
        })
    }

    fn get_once<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Option<Value>> {
        Box::pin(async move {
            path::validate(path)?;
            Ok(self.lock()?.nodes.get(path).cloned())
        })
    }

    fn children<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Vec<Child>> {
        Box::pin(async move {
            path::validate(path)?;
            let inner = self.lock()?;
            Ok(Self::collect_children(&inner.nodes, path))
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            path::validate(path)?;
            let removed = {
                let mut inner = self.lock()?;
                let before = inner.nodes.len();
                inner
                    .nodes
                    .retain(|key, _| !path::is_same_or_descendant(key, path));
                before - inner.nodes.len()
            };
            debug!(store.path = %path, store.removed = removed, "Deleted nodes");
            if removed > 0 {
                self.notify(path);
            }
            Ok(())
        })
    }

    fn push<'a>(&'a self, path: &'a str, value: Value) -> StoreFuture<'a, String> {
        Box::pin(async move {
            path::validate(path)?;
            let key = {
                let mut inner = self.lock()?;
                inner.push_seq += 1;
                let key = format!("{:020}", inner.push_seq);
                inner.nodes.insert(path::join(path, &key), value);
                key
            };
            self.notify(&path::join(path, &key));
            Ok(key)
        })
    }

    fn increment<'a>(&'a self, path: &'a str, delta: i64) -> StoreFuture<'a, i64> {
        Box::pin(async move {
            path::validate(path)?;
            let next = {
                let mut inner = self.lock()?;
                let current = match inner.nodes.get(path) {
                    None | Some(Value::Null) => 0,
                    Some(value) => value
                        .as_i64()
                        .ok_or_else(|| StoreError::NotACounter(path.to_string()))?,
                };
                let next = current + delta;
                inner.nodes.insert(path.to_string(), Value::from(next));
                next
            };
            self.notify(path);
            Ok(next)
        })
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
