use crate::domain::feed::{Feed, NewFeedItem, SystemSettings};
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Storage primitives the ingestion pipeline needs.
///
/// Methods take `&mut self`: an implementation owns a single connection and
/// callers serialize access through [`SharedFeedStore`].
#[async_trait]
pub trait FeedStore: Send {
    /// All subscribed feeds
    async fn list_feeds(&mut self) -> AppResult<Vec<Feed>>;

    /// The subset of `hashes` not yet stored as items of `feed_id`
    async fn missing_hashes(&mut self, feed_id: Uuid, hashes: &[i64]) -> AppResult<HashSet<i64>>;

    /// Stream `items` to storage in one bulk transfer. Returns the number of rows written.
    async fn bulk_insert_items(&mut self, items: &[NewFeedItem]) -> AppResult<u64>;

    /// Overwrite a feed's stored aggregate hash
    async fn update_feed_hash(&mut self, feed_id: Uuid, hash: i64) -> AppResult<()>;

    /// Record the time and reason of a feed's latest failure
    async fn record_failure(
        &mut self,
        feed_id: Uuid,
        failed_at: DateTime<Utc>,
        reason: &str,
    ) -> AppResult<()>;

    /// Operator overrides, if the settings row exists
    async fn system_settings(&mut self) -> AppResult<Option<SystemSettings>>;
}

/// The one storage context shared by every feed of a cycle.
pub type SharedFeedStore = Arc<Mutex<Box<dyn FeedStore>>>;

pub fn shared(store: impl FeedStore + 'static) -> SharedFeedStore {
    Arc::new(Mutex::new(Box::new(store)))
}
