//! PostgreSQL record store.
//!
//! Every node is a row of `store_nodes` holding its full path, its parent
//! path, its last segment and a JSONB value. Counters are incremented with a
//! single upsert, so concurrent increments never lose updates. Writes are
//! announced with `pg_notify`, and a background `LISTEN` task feeds them into
//! [`RecordStore::changes`], so watchers see writes from every process
//! sharing the database.
//!
//! Keys are ordered with `COLLATE "C"`, i.e. by byte, matching
//! [`MemoryStore`](crate::MemoryStore) whatever the database collation is.
//! Field values in [`RecordStore::query_ordered_limit_last`] are ordered by
//! JSONB comparison, which ranks types as null < string < number < boolean
//! < array < object. That differs from [`compare_values`](crate::ordering::compare_values)
//! when one field holds values of mixed types.

use std::time::Duration;

use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::postgres::{PgListener, PgPoolOptions};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::{Child, RecordStore, StoreFuture, path};

/// Notification channel carrying changed paths.
pub const CHANGE_CHANNEL: &str = "admitdesk_changes";

const CHANGE_CHANNEL_CAPACITY: usize = 256;

pub struct PgStore {
    pool: PgPool,
    changes: broadcast::Sender<String>,
    listener: JoinHandle<()>,
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

impl PgStore {
    /// Connects, applies migrations and starts the change listener.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let sender = changes.clone();
        let listener = tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        let _ = sender.send(notification.payload().to_string());
                    }
                    Err(sqlx::Error::PoolClosed) => break,
                    Err(e) => {
                        warn!(error = %e, "Change listener error, retrying");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        info!("PostgreSQL record store ready");
        Ok(Self {
            pool,
            changes,
            listener,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn notify(&self, changed: &str) {
        if let Err(e) = sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANGE_CHANNEL)
            .bind(changed)
            .execute(&self.pool)
            .await
        {
            warn!(store.path = %changed, error = %e, "Failed to announce change");
        }
    }

    fn to_children(rows: Vec<(String, Value)>) -> Vec<Child> {
        rows.into_iter()
            .map(|(key, value)| Child::new(key, value))
            .collect()
    }
}

impl Drop for PgStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl RecordStore for PgStore {
    fn put<'a>(&'a self, path: &'a str, value: Value) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            path::validate(path)?;
            let (parent, key) = path::split(path);
            sqlx::query(
                r#"
                INSERT INTO store_nodes (path, parent, key, value)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (path) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
                "#,
            )
            .bind(path)
            .bind(parent)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;

            self.notify(path).await;
            Ok(())
        })
    }

    fn patch<'a>(&'a self, path: &'a str, partial: Map<String, Value>) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            path::validate(path)?;
            let result = sqlx::query(
                r#"
                UPDATE store_nodes
                SET value = CASE WHEN jsonb_typeof(value) = 'object' THEN value || $2 ELSE $2 END,
                    updated_at = NOW()
                WHERE path = $1
                "#,
            )
            .bind(path)
            .bind(Value::Object(partial))
            .execute(&self.pool)
            .await?;

            let found = result.rows_affected() > 0;
            if found {
                self.notify(path).await;
            }
            Ok(found)
        })
    }

    fn get_once<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Option<Value>> {
        Box::pin(async move {
            path::validate(path)?;
            let value = sqlx::query_scalar::<_, Value>("SELECT value FROM store_nodes WHERE path = $1")
                .bind(path)
                .fetch_optional(&self.pool)
                .await?;
            Ok(value)
        })
    }

    fn children<'a>(&'a self, path: &'a str) -> StoreFuture<'a, Vec<Child>> {
        Box::pin(async move {
            path::validate(path)?;
            let rows = sqlx::query_as::<_, (String, Value)>(
                "SELECT key, value FROM store_nodes WHERE parent = $1 ORDER BY key COLLATE \"C\"",
            )
            .bind(path)
            .fetch_all(&self.pool)
            .await?;
            Ok(Self::to_children(rows))
        })
    }

    fn query_equal<'a>(
        &'a self,
        path: &'a str,
        field: &'a str,
        value: &'a Value,
    ) -> StoreFuture<'a, Vec<Child>> {
        Box::pin(async move {
            path::validate(path)?;
            let rows = sqlx::query_as::<_, (String, Value)>(
                r#"
                SELECT key, value FROM store_nodes
                WHERE parent = $1 AND value -> $2 = $3
                ORDER BY key COLLATE "C"
                "#,
            )
            .bind(path)
            .bind(field)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
            Ok(Self::to_children(rows))
        })
    }

    fn query_ordered_limit_last<'a>(
        &'a self,
        path: &'a str,
        field: &'a str,
        n: usize,
    ) -> StoreFuture<'a, Vec<Child>> {
        Box::pin(async move {
            path::validate(path)?;
            let limit = i64::try_from(n).unwrap_or(i64::MAX);
            let rows = sqlx::query_as::<_, (String, Value)>(
                r#"
                SELECT key, value FROM (
                    SELECT key, value FROM store_nodes
                    WHERE parent = $1
                    ORDER BY value -> $2 DESC NULLS LAST, key COLLATE "C" DESC
                    LIMIT $3
                ) newest
                ORDER BY value -> $2 ASC NULLS FIRST, key COLLATE "C" ASC
                "#,
            )
            .bind(path)
            .bind(field)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
            Ok(Self::to_children(rows))
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            path::validate(path)?;
            let result = sqlx::query(
                "DELETE FROM store_nodes WHERE path = $1 OR left(path, length($2)) = $2",
            )
            .bind(path)
            .bind(format!("{path}/"))
            .execute(&self.pool)
            .await?;

            debug!(store.removed = result.rows_affected(), "Deleted nodes");
            if result.rows_affected() > 0 {
                self.notify(path).await;
            }
            Ok(())
        })
    }

    fn push<'a>(&'a self, path: &'a str, value: Value) -> StoreFuture<'a, String> {
        Box::pin(async move {
            path::validate(path)?;
            let key = sqlx::query_scalar::<_, String>(
                r#"
                INSERT INTO store_nodes (path, parent, key, value)
                SELECT $1 || '/' || k, $1, k, $2
                FROM (SELECT lpad(nextval('store_push_seq')::text, 20, '0') AS k) next_key
                RETURNING key
                "#,
            )
            .bind(path)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;

            self.notify(&path::join(path, &key)).await;
            Ok(key)
        })
    }

    fn increment<'a>(&'a self, path: &'a str, delta: i64) -> StoreFuture<'a, i64> {
        Box::pin(async move {
            path::validate(path)?;
            let (parent, key) = path::split(path);
            let next = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO store_nodes (path, parent, key, value)
                VALUES ($1, $2, $3, to_jsonb($4::bigint))
                ON CONFLICT (path) DO UPDATE
                SET value = to_jsonb(COALESCE((store_nodes.value #>> '{}')::bigint, 0) + $4::bigint),
                    updated_at = NOW()
                RETURNING (value #>> '{}')::bigint
                "#,
            )
            .bind(path)
            .bind(parent)
            .bind(key)
            .bind(delta)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.code().as_deref() == Some("22P02") => {
                    StoreError::NotACounter(path.to_string())
                }
                other => StoreError::Database(other),
            })?;

            self.notify(path).await;
            Ok(next)
        })
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
