use crate::domain::feed::NewFeedItem;
use std::collections::HashSet;
use uuid::Uuid;

use super::identity::Identity;

/// An entry as produced by the feed-format decoder. No identity guarantee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedItem {
    pub id: Option<String>,
    pub link: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A raw entry with its resolved identity and content hash.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeedItem {
    pub raw: RawFeedItem,
    pub identity: Identity,
    pub hash: i64,
}

/// Deduplicated, hashed entries of one fetch plus the aggregate feed hash.
///
/// `item_hashes` is exactly the set of `items[..].hash`; no two items share a hash.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    pub items: Vec<ParsedFeedItem>,
    pub item_hashes: HashSet<i64>,
    pub feed_hash: i64,
}

impl ParsedFeed {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item hashes in feed order
    pub fn hashes(&self) -> Vec<i64> {
        self.items.iter().map(|item| item.hash).collect()
    }
}

/// What one cycle writes for one feed: rows to insert and the aggregate hash to store.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdateModel {
    pub feed_id: Uuid,
    pub items: Vec<NewFeedItem>,
    pub new_hash: Option<i64>,
}

/// Totals written by one `import` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub items_inserted: u64,
    pub hashes_updated: usize,
}
