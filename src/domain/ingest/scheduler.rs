use crate::error::{AppError, AppResult};
use crate::infrastructure::config::IngestSettings;
use crate::infrastructure::http::{FeedFetcher, HttpFeedFetcher};
use crate::infrastructure::repositories::SharedFeedStore;
use std::sync::Arc;
use std::time::Duration;

use super::orchestrator::IngestOrchestrator;

/// Builds the fetcher for one cycle from that cycle's settings.
pub trait FetcherFactory: Send + Sync {
    fn build(&self, settings: &IngestSettings) -> AppResult<Arc<dyn FeedFetcher>>;
}

/// Produces a fresh [`HttpFeedFetcher`] per cycle so timeout and User-Agent
/// changes take effect without a restart.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcherFactory;

impl FetcherFactory for HttpFetcherFactory {
    fn build(&self, settings: &IngestSettings) -> AppResult<Arc<dyn FeedFetcher>> {
        Ok(Arc::new(HttpFeedFetcher::new(settings)?))
    }
}

pub struct CycleScheduler {
    store: SharedFeedStore,
    orchestrator: IngestOrchestrator,
    fetchers: Arc<dyn FetcherFactory>,
    defaults: IngestSettings,
}

impl CycleScheduler {
    pub fn new(
        store: SharedFeedStore,
        orchestrator: IngestOrchestrator,
        fetchers: Arc<dyn FetcherFactory>,
        defaults: IngestSettings,
    ) -> Self {
        Self {
            store,
            orchestrator,
            fetchers,
            defaults,
        }
    }

    /// Run cycles until one fails. Only returns on a fatal error.
    pub async fn run(&self) -> AppError {
        loop {
            match self.run_once().await {
                Ok(pause) => {
                    tracing::debug!(pause_secs = pause.as_secs(), "Sleeping until next cycle");
                    tokio::time::sleep(pause).await;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        storage = e.is_storage(),
                        "Ingestion cycle failed, stopping"
                    );
                    return e;
                }
            }
        }
    }

    /// One pass: resolve settings, run a cycle, return the pause to apply.
    pub async fn run_once(&self) -> AppResult<Duration> {
        let settings = self.settings().await;
        let fetcher = self.fetchers.build(&settings)?;

        self.orchestrator.run_cycle(fetcher).await?;

        Ok(settings.pause)
    }

    /// Configured defaults with the stored overrides applied. An unreadable
    /// settings row leaves the defaults in place for this cycle.
    pub async fn settings(&self) -> IngestSettings {
        let overrides = match self.store.lock().await.system_settings().await {
            Ok(overrides) => overrides,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read system settings, using defaults");
                None
            }
        };

        self.defaults.clone().with_overrides(overrides.as_ref())
    }
}
