use feed_rs::model::Link;
use feed_rs::parser;
use std::collections::HashSet;
use std::sync::Arc;

use super::error::{ErrorContext, IngestError};
use super::hasher::ContentHasher;
use super::identity::IdentityResolver;
use super::model::{ParsedFeed, ParsedFeedItem, RawFeedItem};

/// Turns raw feed bytes into a deduplicated, hashed item set.
pub struct FeedParser {
    hasher: Arc<dyn ContentHasher>,
    resolver: IdentityResolver,
}

impl FeedParser {
    pub fn new(hasher: Arc<dyn ContentHasher>, resolver: IdentityResolver) -> Self {
        Self { hasher, resolver }
    }

    /// Decode and hash one feed document.
    ///
    /// Only a document the decoder rejects outright is an error; malformed
    /// individual entries are skipped.
    pub fn parse(&self, raw: &[u8]) -> Result<ParsedFeed, IngestError> {
        let items = decode_items(raw)?;
        Ok(self.parse_items(items))
    }

    /// Deduplicate and hash already-decoded entries.
    ///
    /// Entries are visited last-to-first so the aggregate hash sees identities
    /// oldest-first for the usual newest-first feed. The aggregate hash is
    /// order-sensitive. The returned items keep the original feed order.
    pub fn parse_items(&self, items: Vec<RawFeedItem>) -> ParsedFeed {
        let mut item_hashes = HashSet::with_capacity(items.len());
        let mut accepted = Vec::with_capacity(items.len());

        for raw in items.into_iter().rev() {
            let Some(identity) = self.resolver.resolve(&raw) else {
                tracing::debug!(
                    has_description = raw.description.is_some(),
                    "Skipping feed item without id, link or title"
                );
                continue;
            };

            let hash = self.hasher.hash(identity.as_bytes());
            if !item_hashes.insert(hash) {
                tracing::debug!(identity = %identity, hash, "Skipping duplicate feed item");
                continue;
            }

            accepted.push(ParsedFeedItem {
                raw,
                identity,
                hash,
            });
        }

        // Identities in visit order, streamed through one hasher state
        let chunks: Vec<&[u8]> = accepted.iter().map(|item| item.identity.as_bytes()).collect();
        let feed_hash = self.hasher.hash_chunks(&chunks);
        accepted.reverse();

        ParsedFeed {
            items: accepted,
            item_hashes,
            feed_hash,
        }
    }
}

/// Decode RSS / Atom / JSON Feed bytes into raw entries.
///
/// feed-rs normally invents an id for entries that lack one; the generator
/// here yields an empty id instead so identity falls through to link/title.
pub fn decode_items(raw: &[u8]) -> Result<Vec<RawFeedItem>, IngestError> {
    let decoder = parser::Builder::new()
        .id_generator(|_links, _title, _uri| String::new())
        .build();

    let feed = decoder.parse(raw).map_err(|e| {
        IngestError::decode(e.to_string(), ErrorContext::new().with_content(raw))
    })?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| RawFeedItem {
            id: Some(entry.id).filter(|id| !id.is_empty()),
            link: permalink(entry.links),
            title: entry.title.map(|t| t.content),
            description: entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body)),
        })
        .collect();

    Ok(items)
}

/// The entry's page: the first `alternate` (or unlabelled) link, else the first link.
fn permalink(mut links: Vec<Link>) -> Option<String> {
    if links.is_empty() {
        return None;
    }
    let index = links
        .iter()
        .position(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
        .unwrap_or(0);
    Some(links.swap_remove(index).href)
}
