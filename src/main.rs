use anyhow::Context;
use feedtape_ingest::domain::ingest::{
    CycleScheduler, FeedParser, HttpFetcherFactory, IdentityResolver, ImportService,
    IngestOrchestrator, XxHasher,
};
use feedtape_ingest::infrastructure::config::{Config, LogFormat};
use feedtape_ingest::infrastructure::db::{check_connection, connect, run_migrations};
use feedtape_ingest::infrastructure::repositories::{self, FeedRepository};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        max_concurrent_fetches = config.max_concurrent_fetches,
        "Starting FeedTape ingestion"
    );

    // One connection carries every storage operation of the process
    let mut conn = connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    check_connection(&mut conn)
        .await
        .context("database connection check failed")?;
    tracing::info!("Database connection verified");

    run_migrations(&mut conn).await?;
    tracing::info!("Database migrations applied");

    // === DEPENDENCY INJECTION SETUP ===
    let store = repositories::shared(FeedRepository::new(conn));

    let parser = Arc::new(FeedParser::new(
        Arc::new(XxHasher::new()),
        IdentityResolver::new(),
    ));
    let orchestrator = IngestOrchestrator::new(
        store.clone(),
        parser,
        ImportService::new(),
        config.max_concurrent_fetches,
    );
    let scheduler = CycleScheduler::new(
        store,
        orchestrator,
        Arc::new(HttpFetcherFactory),
        config.ingest_defaults(),
    );

    let err = scheduler.run().await;
    tracing::error!(error = %err, "Ingestion stopped");
    std::process::exit(1);
}

fn init_logging(config: &Config) {
    let default_filter = if config.is_development() {
        "feedtape_ingest=debug,sqlx=warn"
    } else {
        "feedtape_ingest=info,sqlx=warn"
    };

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
