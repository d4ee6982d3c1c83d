//! Event store gateway for persisting and polling canonical events.
//!
//! Provides a trait-based abstraction over the store so handlers can be
//! exercised without a database. Production uses [`PostgresEventStore`]
//! against a pooled connection; tests use [`mock::MemoryEventStore`].
//!
//! The store stamps `created_at` itself at the moment of the call: the
//! provider-supplied event timestamp is untrusted client data and is never
//! used as the sort key.

use std::{future::Future, pin::Pin, sync::Arc};

use chrono::Utc;
use sqlx::PgPool;

use crate::{
    error::Result,
    models::{CanonicalEvent, EventId, StoredEvent},
};

/// Default number of events returned by the polling query.
pub const DEFAULT_POLL_LIMIT: i64 = 50;

/// Store operations required by the webhook service.
///
/// There are exactly two: record one event, list the most recent ones. No
/// update or delete path exists; records are immutable once stored.
pub trait EventStore: Send + Sync + 'static {
    /// Persists a canonical event and returns the store-assigned identifier.
    ///
    /// Stamps `created_at` with the current time at the moment of the call.
    /// Fails with a persistence error if the store is unreachable or rejects
    /// the write; the failure is surfaced to the caller, never dropped.
    fn record(
        &self,
        event: CanonicalEvent,
    ) -> Pin<Box<dyn Future<Output = Result<EventId>> + Send + '_>>;

    /// Returns up to `limit` most-recently-stored events, newest first.
    ///
    /// Ordered by `created_at` descending; ties have unspecified but stable
    /// relative order. An empty store yields an empty Vec, not an error.
    fn list_recent(
        &self,
        limit: i64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<StoredEvent>>> + Send + '_>>;
}

/// Production store implementation backed by PostgreSQL.
///
/// Every poll is a fresh bounded query against the full collection; there is
/// no caching or eviction logic in front of it.
pub struct PostgresEventStore {
    pool: Arc<PgPool>,
}

impl PostgresEventStore {
    /// Creates a new store gateway over the given connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }
}

impl EventStore for PostgresEventStore {
    fn record(
        &self,
        event: CanonicalEvent,
    ) -> Pin<Box<dyn Future<Output = Result<EventId>> + Send + '_>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let id: EventId = sqlx::query_scalar(
                r#"
                INSERT INTO canonical_events (
                    id, request_id, author, action, from_branch, to_branch,
                    pr_action, event_timestamp, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id
                "#,
            )
            .bind(EventId::new())
            .bind(&event.request_id)
            .bind(&event.author)
            .bind(event.kind.tag())
            .bind(&event.from_branch)
            .bind(&event.to_branch)
            .bind(event.kind.sub_action())
            .bind(&event.timestamp)
            .bind(Utc::now())
            .fetch_one(&*pool)
            .await?;

            Ok(id)
        })
    }

    fn list_recent(
        &self,
        limit: i64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<StoredEvent>>> + Send + '_>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let events = sqlx::query_as::<_, StoredEvent>(
                r#"
                SELECT id, request_id, author, action, from_branch, to_branch,
                       pr_action, event_timestamp, created_at
                FROM canonical_events
                ORDER BY created_at DESC
                LIMIT $1
                "#,
            )
            .bind(limit)
            .fetch_all(&*pool)
            .await?;

            Ok(events)
        })
    }
}

pub mod mock {
    //! In-memory store implementation for testing.
    //!
    //! Keeps events in insertion order, which matches `created_at` ordering
    //! under a forward-moving clock and gives stable tie order. Supports
    //! injecting persistence failures to exercise the error paths.

    use std::{future::Future, pin::Pin, sync::Arc};

    use chrono::Utc;
    use tokio::sync::RwLock;

    use super::{CanonicalEvent, EventId, EventStore, StoredEvent};
    use crate::error::{CoreError, Result};

    /// Mock store for testing handlers without a database.
    #[derive(Default)]
    pub struct MemoryEventStore {
        events: Arc<RwLock<Vec<StoredEvent>>>,
        record_error: Arc<RwLock<Option<String>>>,
        list_error: Arc<RwLock<Option<String>>>,
    }

    impl MemoryEventStore {
        /// Creates a new empty in-memory store.
        pub fn new() -> Self {
            Self::default()
        }

        /// Injects an error for every subsequent record operation.
        pub async fn fail_records(&self, error: impl Into<String>) {
            *self.record_error.write().await = Some(error.into());
        }

        /// Injects an error for every subsequent list operation.
        pub async fn fail_lists(&self, error: impl Into<String>) {
            *self.list_error.write().await = Some(error.into());
        }

        /// Returns all stored events in insertion order, for verification.
        pub async fn stored(&self) -> Vec<StoredEvent> {
            self.events.read().await.clone()
        }
    }

    impl EventStore for MemoryEventStore {
        fn record(
            &self,
            event: CanonicalEvent,
        ) -> Pin<Box<dyn Future<Output = Result<EventId>> + Send + '_>> {
            let events = self.events.clone();
            let record_error = self.record_error.clone();

            Box::pin(async move {
                if let Some(error) = record_error.read().await.clone() {
                    return Err(CoreError::Persistence(error));
                }

                let id = EventId::new();
                events.write().await.push(StoredEvent {
                    id,
                    event,
                    created_at: Utc::now(),
                });

                Ok(id)
            })
        }

        fn list_recent(
            &self,
            limit: i64,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<StoredEvent>>> + Send + '_>> {
            let events = self.events.clone();
            let list_error = self.list_error.clone();

            Box::pin(async move {
                if let Some(error) = list_error.read().await.clone() {
                    return Err(CoreError::Persistence(error));
                }

                let limit = usize::try_from(limit.max(0)).unwrap_or(0);
                let events = events.read().await;
                Ok(events.iter().rev().take(limit).cloned().collect())
            })
        }
    }
}
