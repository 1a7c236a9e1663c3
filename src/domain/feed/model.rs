use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A subscribed feed. `hash` is the aggregate hash of the last successful parse.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Feed {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub hash: Option<i64>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A persisted feed entry. Unique per `(feed_id, content_hash)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct FeedItem {
    pub id: i64,
    pub feed_id: Uuid,
    pub content_hash: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A feed entry waiting to be bulk-imported.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedItem {
    pub feed_id: Uuid,
    pub content_hash: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Operator overrides stored in the `system_settings` row. NULL columns fall back to config.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, PartialEq)]
pub struct SystemSettings {
    pub request_timeout_seconds: Option<i32>,
    pub user_agent: Option<String>,
    pub pause_seconds: Option<i32>,
}
