use anyhow::Result;
use feedtape_ingest::domain::feed::{Feed, FeedItem, SystemSettings};
use sqlx::PgPool;
use uuid::Uuid;

/// Raw SQL setup and inspection, bypassing the code under test
pub struct TestFixtures {
    pool: PgPool,
}

impl TestFixtures {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_feed(&self, name: &str, url: &str) -> Result<Feed> {
        let feed = sqlx::query_as::<_, Feed>(
            r#"
            INSERT INTO feeds (id, name, url)
            VALUES ($1, $2, $3)
            RETURNING id, name, url, hash, last_failure_at, last_failure_reason, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(url)
        .fetch_one(&self.pool)
        .await?;

        Ok(feed)
    }

    pub async fn create_feed_with_hash(&self, name: &str, url: &str, hash: i64) -> Result<Feed> {
        let feed = self.create_feed(name, url).await?;
        sqlx::query("UPDATE feeds SET hash = $1 WHERE id = $2")
            .bind(hash)
            .bind(feed.id)
            .execute(&self.pool)
            .await?;

        Ok(Feed {
            hash: Some(hash),
            ..feed
        })
    }

    pub async fn create_item(&self, feed_id: Uuid, content_hash: i64, title: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feed_items (feed_id, content_hash, title, created_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(feed_id)
        .bind(content_hash)
        .bind(title)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_settings(&self, settings: &SystemSettings) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (id, request_timeout_seconds, user_agent, pause_seconds)
            VALUES (1, $1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET request_timeout_seconds = EXCLUDED.request_timeout_seconds,
                user_agent = EXCLUDED.user_agent,
                pause_seconds = EXCLUDED.pause_seconds,
                updated_at = NOW()
            "#,
        )
        .bind(settings.request_timeout_seconds)
        .bind(&settings.user_agent)
        .bind(settings.pause_seconds)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn feed(&self, feed_id: Uuid) -> Result<Feed> {
        let feed = sqlx::query_as::<_, Feed>(
            r#"
            SELECT id, name, url, hash, last_failure_at, last_failure_reason, created_at
            FROM feeds
            WHERE id = $1
            "#,
        )
        .bind(feed_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(feed)
    }

    /// Stored items of a feed in insertion order
    pub async fn items(&self, feed_id: Uuid) -> Result<Vec<FeedItem>> {
        let items = sqlx::query_as::<_, FeedItem>(
            r#"
            SELECT id, feed_id, content_hash, title, description, url, created_at
            FROM feed_items
            WHERE feed_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
