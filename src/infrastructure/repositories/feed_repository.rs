use crate::domain::feed::{Feed, NewFeedItem, SystemSettings};
use crate::error::AppResult;
use crate::infrastructure::db::copy::BinaryCopyEncoder;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use std::collections::HashSet;
use uuid::Uuid;

use super::feed_store::FeedStore;

const COPY_FEED_ITEMS: &str = r#"
    COPY feed_items (feed_id, content_hash, title, description, url, created_at)
    FROM STDIN (FORMAT binary)
"#;

const FEED_ITEM_COLUMNS: i16 = 6;

/// Postgres-backed [`FeedStore`] over a single connection.
pub struct FeedRepository {
    conn: PgConnection,
}

impl FeedRepository {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl FeedStore for FeedRepository {
    async fn list_feeds(&mut self) -> AppResult<Vec<Feed>> {
        let feeds = sqlx::query_as::<_, Feed>(
            r#"
            SELECT id, name, url, hash, last_failure_at, last_failure_reason, created_at
            FROM feeds
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&mut self.conn)
        .await?;

        Ok(feeds)
    }

    async fn missing_hashes(&mut self, feed_id: Uuid, hashes: &[i64]) -> AppResult<HashSet<i64>> {
        if hashes.is_empty() {
            return Ok(HashSet::new());
        }

        let missing = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT candidates.hash
            FROM UNNEST($2::BIGINT[]) AS candidates(hash)
            WHERE NOT EXISTS (
                SELECT 1 FROM feed_items
                WHERE feed_items.feed_id = $1 AND feed_items.content_hash = candidates.hash
            )
            "#,
        )
        .bind(feed_id)
        .bind(hashes.to_vec())
        .fetch_all(&mut self.conn)
        .await?;

        Ok(missing.into_iter().collect())
    }

    async fn bulk_insert_items(&mut self, items: &[NewFeedItem]) -> AppResult<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let payload = encode_feed_items(items);

        let mut copy = self.conn.copy_in_raw(COPY_FEED_ITEMS).await?;
        let sent = copy.send(payload).await.map(|_| ());
        if let Err(e) = sent {
            copy.abort(e.to_string()).await?;
            return Err(e.into());
        }
        let rows = copy.finish().await?;

        Ok(rows)
    }

    async fn update_feed_hash(&mut self, feed_id: Uuid, hash: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE feeds
            SET hash = $1
            WHERE id = $2
            "#,
        )
        .bind(hash)
        .bind(feed_id)
        .execute(&mut self.conn)
        .await?;

        Ok(())
    }

    async fn record_failure(
        &mut self,
        feed_id: Uuid,
        failed_at: DateTime<Utc>,
        reason: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE feeds
            SET last_failure_at = $1, last_failure_reason = $2
            WHERE id = $3
            "#,
        )
        .bind(failed_at)
        .bind(reason)
        .bind(feed_id)
        .execute(&mut self.conn)
        .await?;

        Ok(())
    }

    async fn system_settings(&mut self) -> AppResult<Option<SystemSettings>> {
        let settings = sqlx::query_as::<_, SystemSettings>(
            r#"
            SELECT request_timeout_seconds, user_agent, pause_seconds
            FROM system_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&mut self.conn)
        .await?;

        Ok(settings)
    }
}

/// Binary COPY payload for `feed_items`, columns in `COPY_FEED_ITEMS` order.
pub fn encode_feed_items(items: &[NewFeedItem]) -> Vec<u8> {
    let mut encoder = BinaryCopyEncoder::new(FEED_ITEM_COLUMNS);
    for item in items {
        encoder.start_row();
        encoder.write_uuid(&item.feed_id);
        encoder.write_i64(item.content_hash);
        encoder.write_text(item.title.as_deref());
        encoder.write_text(item.description.as_deref());
        encoder.write_text(item.url.as_deref());
        encoder.write_timestamptz(&item.created_at);
    }
    encoder.finish()
}
