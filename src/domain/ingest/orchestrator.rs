use crate::domain::feed::Feed;
use crate::error::{AppError, AppResult};
use crate::infrastructure::http::FeedFetcher;
use crate::infrastructure::repositories::SharedFeedStore;
use chrono::Utc;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::error::IngestError;
use super::import::ImportService;
use super::parser::FeedParser;

/// Where a feed's pipeline was when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStage {
    Fetching,
    Parsing,
    Diffing,
    Importing,
}

impl fmt::Display for FeedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedStage::Fetching => "fetching",
            FeedStage::Parsing => "parsing",
            FeedStage::Diffing => "diffing",
            FeedStage::Importing => "importing",
        };
        f.write_str(name)
    }
}

/// How one feed finished a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Aggregate hash matched the stored one; storage was not touched
    Unchanged,
    Updated { items_imported: u64 },
    Failed { stage: FeedStage },
    /// The feed's task panicked; its failure is recorded like any other
    Panicked,
}

/// Counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub feeds: usize,
    pub unchanged: usize,
    pub updated: usize,
    pub failed: usize,
    pub items_imported: u64,
}

impl CycleReport {
    fn record(&mut self, outcome: FeedOutcome) {
        match outcome {
            FeedOutcome::Unchanged => self.unchanged += 1,
            FeedOutcome::Updated { items_imported } => {
                self.updated += 1;
                self.items_imported += items_imported;
            }
            FeedOutcome::Failed { .. } | FeedOutcome::Panicked => self.failed += 1,
        }
    }
}

/// Runs one fetch cycle across all subscribed feeds.
///
/// Feeds are processed concurrently, at most `max_concurrency` at a time.
/// Fetching and parsing hold no lock; every storage interaction goes through
/// the shared store's mutex, held for a feed's whole diff-and-import phase.
#[derive(Clone)]
pub struct IngestOrchestrator {
    store: SharedFeedStore,
    parser: Arc<FeedParser>,
    importer: ImportService,
    max_concurrency: usize,
}

impl IngestOrchestrator {
    pub fn new(
        store: SharedFeedStore,
        parser: Arc<FeedParser>,
        importer: ImportService,
        max_concurrency: usize,
    ) -> Self {
        Self {
            store,
            parser,
            importer,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Process every feed once.
    ///
    /// Per-feed failures, panics included, are recorded on the feed and never
    /// fail the cycle. An `Err` means the cycle itself broke (feeds could not be
    /// listed, the limiter closed, or a task was cancelled).
    pub async fn run_cycle(&self, fetcher: Arc<dyn FeedFetcher>) -> AppResult<CycleReport> {
        let started = Instant::now();
        let feeds = self.store.lock().await.list_feeds().await?;

        let mut report = CycleReport {
            feeds: feeds.len(),
            ..Default::default()
        };
        tracing::info!(feeds = feeds.len(), "Starting ingestion cycle");

        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for feed in feeds {
            let orchestrator = self.clone();
            let fetcher = fetcher.clone();
            let permits = permits.clone();

            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Internal(format!("fetch limiter closed: {}", e)))?;
                orchestrator.process_feed_isolated(feed, fetcher).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| AppError::Internal(format!("feed task did not complete: {}", e)))??;
            report.record(outcome);
        }

        tracing::info!(
            feeds = report.feeds,
            unchanged = report.unchanged,
            updated = report.updated,
            failed = report.failed,
            items_imported = report.items_imported,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Finished ingestion cycle"
        );

        Ok(report)
    }

    /// Run one feed's pipeline on its own task so a panic stays with that feed.
    async fn process_feed_isolated(
        &self,
        feed: Feed,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> AppResult<FeedOutcome> {
        let worker = self.clone();
        let subject = feed.clone();
        let handle =
            tokio::spawn(async move { worker.process_feed(subject, fetcher.as_ref()).await });

        match handle.await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_panic() => {
                let reason = format!("feed task panicked: {}", panic_message(e.into_panic()));
                tracing::error!(
                    feed_id = %feed.id,
                    url = %feed.url,
                    error = %reason,
                    "Feed ingestion panicked"
                );
                self.record_failure(&feed, &reason).await;
                Ok(FeedOutcome::Panicked)
            }
            Err(e) => Err(AppError::Internal(format!("feed task did not complete: {}", e))),
        }
    }

    /// Run one feed's pipeline, turning any failure into a persisted failure record.
    pub async fn process_feed(&self, feed: Feed, fetcher: &dyn FeedFetcher) -> FeedOutcome {
        match self.ingest_feed(&feed, fetcher).await {
            Ok(outcome) => outcome,
            Err((stage, err)) => {
                let err = err
                    .with_context("stage", stage)
                    .with_context("feed_id", feed.id);
                tracing::error!(
                    feed_id = %feed.id,
                    url = %feed.url,
                    stage = %stage,
                    error = %err,
                    context = %err.context(),
                    "Feed ingestion failed"
                );
                self.record_failure(&feed, &err.to_string()).await;
                FeedOutcome::Failed { stage }
            }
        }
    }

    async fn ingest_feed(
        &self,
        feed: &Feed,
        fetcher: &dyn FeedFetcher,
    ) -> Result<FeedOutcome, (FeedStage, IngestError)> {
        let raw = fetcher
            .fetch(feed)
            .await
            .map_err(|e| (FeedStage::Fetching, e))?;

        let parsed = self
            .parser
            .parse(&raw)
            .map_err(|e| (FeedStage::Parsing, e.with_context("url", &feed.url)))?;

        if feed.hash == Some(parsed.feed_hash) {
            tracing::debug!(feed_id = %feed.id, hash = parsed.feed_hash, "Feed unchanged");
            return Ok(FeedOutcome::Unchanged);
        }

        let mut store = self.store.lock().await;

        let missing = self
            .importer
            .missing_hashes(&mut **store, feed.id, &parsed.hashes())
            .await
            .map_err(|e| (FeedStage::Diffing, IngestError::from(e)))?;

        let update = self.importer.plan(feed, &parsed, &missing, Utc::now());

        let summary = self
            .importer
            .import(&mut **store, std::slice::from_ref(&update))
            .await
            .map_err(|e| (FeedStage::Importing, IngestError::from(e)))?;

        tracing::info!(
            feed_id = %feed.id,
            parsed = parsed.len(),
            imported = summary.items_inserted,
            "Feed updated"
        );

        Ok(FeedOutcome::Updated {
            items_imported: summary.items_inserted,
        })
    }

    async fn record_failure(&self, feed: &Feed, reason: &str) {
        let mut store = self.store.lock().await;
        if let Err(e) = store.record_failure(feed.id, Utc::now(), reason).await {
            tracing::error!(
                feed_id = %feed.id,
                error = %e,
                "Failed to record feed failure"
            );
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
