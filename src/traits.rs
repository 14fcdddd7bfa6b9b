use crate::types::{Article, Outbound, Result};
use async_trait::async_trait;

/// Trait for the polled inbound source: one bounded page of recent articles
/// per call, newest state of the feed, no paging across calls.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<Article>>;
}

/// Durable high-water mark of announced articles, one row per source key.
///
/// `get` returns 0 when no checkpoint exists yet. `set` must keep the stored
/// value monotonically non-decreasing; it is safe to interleave with an
/// [`ArticleRepository::insert`] for the same item.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<i64>;
    async fn set(&self, key: &str, timestamp: i64) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Durable, append-only record of announced articles keyed by `published`.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn max_published(&self) -> Result<Option<i64>>;

    /// Idempotent on `published`: inserting an already-stored timestamp
    /// reports [`InsertOutcome::AlreadyExists`] instead of failing, so one
    /// duplicate never aborts a batch of legitimate new articles.
    async fn insert(&self, article: &Article) -> Result<InsertOutcome>;
}

/// The external destination receiving rendered notifications.
///
/// A send error is treated as transient by the delivery queue and retried;
/// the transport is expected to enforce its own network timeout.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, payload: &Outbound) -> Result<()>;
}
