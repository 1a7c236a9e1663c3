use crate::e2e::helpers;

use chrono::{TimeZone, Utc};
use feedtape_ingest::domain::feed::{NewFeedItem, SystemSettings};
use feedtape_ingest::infrastructure::repositories::FeedStore;
use helpers::TestContext;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::collections::HashSet;
use uuid::Uuid;

fn new_item(feed_id: Uuid, content_hash: i64, title: Option<&str>) -> NewFeedItem {
    NewFeedItem {
        feed_id,
        content_hash,
        title: title.map(str::to_string),
        description: None,
        url: Some(format!("https://blog.example.com/{}", content_hash)),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 15).unwrap(),
    }
}

#[tokio::test]
#[serial]
async fn it_should_list_subscribed_feeds() {
    let ctx = TestContext::new().await.unwrap();
    let first = ctx.fixtures.create_feed("First", "https://a.example.com/rss").await.unwrap();
    let second = ctx.fixtures.create_feed("Second", "https://b.example.com/rss").await.unwrap();
    let mut repo = ctx.repository().await.unwrap();

    let feeds = repo.list_feeds().await.unwrap();

    let ids: HashSet<Uuid> = feeds.iter().map(|f| f.id).collect();
    assert_eq!(ids, HashSet::from([first.id, second.id]));
    assert!(feeds.iter().all(|f| f.hash.is_none()));
}

#[tokio::test]
#[serial]
async fn it_should_return_only_hashes_not_yet_stored() {
    let ctx = TestContext::new().await.unwrap();
    let feed = ctx.fixtures.create_feed("Blog", "https://a.example.com/rss").await.unwrap();
    let other = ctx.fixtures.create_feed("Other", "https://b.example.com/rss").await.unwrap();
    ctx.fixtures.create_item(feed.id, 1, "one").await.unwrap();
    ctx.fixtures.create_item(other.id, 2, "two").await.unwrap();
    let mut repo = ctx.repository().await.unwrap();

    let missing = repo.missing_hashes(feed.id, &[1, 2, 3, i64::MIN]).await.unwrap();

    // Hash 2 belongs to another feed, so it is still missing for this one
    assert_eq!(missing, HashSet::from([2, 3, i64::MIN]));
}

#[tokio::test]
#[serial]
async fn it_should_bulk_insert_items_with_nulls() {
    let ctx = TestContext::new().await.unwrap();
    let feed = ctx.fixtures.create_feed("Blog", "https://a.example.com/rss").await.unwrap();
    let mut repo = ctx.repository().await.unwrap();
    let items = vec![
        new_item(feed.id, -42, Some("Négative hash ✓")),
        NewFeedItem {
            url: None,
            ..new_item(feed.id, 7, None)
        },
    ];

    let written = repo.bulk_insert_items(&items).await.unwrap();

    assert_eq!(written, 2);
    let stored = ctx.fixtures.items(feed.id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].content_hash, -42);
    assert_eq!(stored[0].title.as_deref(), Some("Négative hash ✓"));
    assert_eq!(stored[0].description, None);
    assert_eq!(stored[0].url.as_deref(), Some("https://blog.example.com/-42"));
    assert_eq!(stored[0].created_at, items[0].created_at);
    assert_eq!(stored[1].title, None);
    assert_eq!(stored[1].url, None);
}

#[tokio::test]
#[serial]
async fn it_should_reject_a_duplicate_item_without_partial_writes() {
    let ctx = TestContext::new().await.unwrap();
    let feed = ctx.fixtures.create_feed("Blog", "https://a.example.com/rss").await.unwrap();
    ctx.fixtures.create_item(feed.id, 5, "already here").await.unwrap();
    let mut repo = ctx.repository().await.unwrap();

    let result = repo
        .bulk_insert_items(&[new_item(feed.id, 4, Some("new")), new_item(feed.id, 5, Some("dup"))])
        .await;

    assert!(result.is_err());
    let stored = ctx.fixtures.items(feed.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title.as_deref(), Some("already here"));
}

#[tokio::test]
#[serial]
async fn it_should_treat_an_empty_batch_as_a_no_op() {
    let ctx = TestContext::new().await.unwrap();
    let mut repo = ctx.repository().await.unwrap();

    assert_eq!(repo.bulk_insert_items(&[]).await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn it_should_update_the_feed_hash() {
    let ctx = TestContext::new().await.unwrap();
    let feed = ctx.fixtures.create_feed("Blog", "https://a.example.com/rss").await.unwrap();
    let mut repo = ctx.repository().await.unwrap();

    repo.update_feed_hash(feed.id, i64::MAX).await.unwrap();

    assert_eq!(ctx.fixtures.feed(feed.id).await.unwrap().hash, Some(i64::MAX));
}

#[tokio::test]
#[serial]
async fn it_should_record_the_latest_failure() {
    let ctx = TestContext::new().await.unwrap();
    let feed = ctx.fixtures.create_feed("Blog", "https://a.example.com/rss").await.unwrap();
    let mut repo = ctx.repository().await.unwrap();
    let first = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

    repo.record_failure(feed.id, first, "fetch failed: HTTP error: 500").await.unwrap();
    repo.record_failure(feed.id, second, "feed could not be decoded: eof").await.unwrap();

    let stored = ctx.fixtures.feed(feed.id).await.unwrap();
    assert_eq!(stored.last_failure_at, Some(second));
    assert_eq!(
        stored.last_failure_reason.as_deref(),
        Some("feed could not be decoded: eof")
    );
    assert_eq!(stored.hash, None);
}

#[tokio::test]
#[serial]
async fn it_should_read_system_settings_when_present() {
    let ctx = TestContext::new().await.unwrap();
    let mut repo = ctx.repository().await.unwrap();

    assert_eq!(repo.system_settings().await.unwrap(), None);

    let settings = SystemSettings {
        request_timeout_seconds: Some(10),
        user_agent: None,
        pause_seconds: Some(0),
    };
    ctx.fixtures.set_settings(&settings).await.unwrap();

    assert_eq!(repo.system_settings().await.unwrap(), Some(settings));
}
