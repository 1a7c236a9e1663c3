use crate::domain::feed::{Feed, NewFeedItem};
use crate::error::AppResult;
use crate::infrastructure::repositories::FeedStore;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use super::model::{FeedUpdateModel, ImportSummary, ParsedFeed};

/// Diffs parsed feeds against stored items and writes only what is new.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportService;

impl ImportService {
    pub fn new() -> Self {
        Self
    }

    /// Candidate hashes with no stored item for this feed yet.
    ///
    /// This is the durable half of deduplication: a hash unique within one
    /// parse may still exist from an earlier cycle.
    pub async fn missing_hashes(
        &self,
        store: &mut dyn FeedStore,
        feed_id: Uuid,
        candidates: &[i64],
    ) -> AppResult<HashSet<i64>> {
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }
        store.missing_hashes(feed_id, candidates).await
    }

    /// Build the update for one feed: rows for the missing items, in feed order,
    /// and the new aggregate hash.
    pub fn plan(
        &self,
        feed: &Feed,
        parsed: &ParsedFeed,
        missing: &HashSet<i64>,
        now: DateTime<Utc>,
    ) -> FeedUpdateModel {
        let items = parsed
            .items
            .iter()
            .filter(|item| missing.contains(&item.hash))
            .map(|item| NewFeedItem {
                feed_id: feed.id,
                content_hash: item.hash,
                title: non_blank(item.raw.title.as_deref()),
                description: non_blank(item.raw.description.as_deref()),
                url: non_blank(item.raw.link.as_deref()),
                created_at: now,
            })
            .collect();

        FeedUpdateModel {
            feed_id: feed.id,
            items,
            new_hash: Some(parsed.feed_hash),
        }
    }

    /// Write a batch of updates.
    ///
    /// Every bulk insert of the batch completes before any hash update is
    /// issued, so a stored hash never points past items that were not written.
    pub async fn import(
        &self,
        store: &mut dyn FeedStore,
        updates: &[FeedUpdateModel],
    ) -> AppResult<ImportSummary> {
        let mut summary = ImportSummary::default();

        for update in updates.iter().filter(|u| !u.items.is_empty()) {
            let inserted = store.bulk_insert_items(&update.items).await?;
            tracing::debug!(feed_id = %update.feed_id, inserted, "Bulk inserted feed items");
            summary.items_inserted += inserted;
        }

        for update in updates {
            let Some(hash) = update.new_hash else {
                continue;
            };
            store.update_feed_hash(update.feed_id, hash).await?;
            summary.hashes_updated += 1;
        }

        Ok(summary)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
