use factnotes_cache::{CacheAsideStore, MemoryCacheBackend};
use factnotes_moderation::{ModerationWorkflow, ResourceLinkRegistry, SummarizationQueue};
use factnotes_platform_access::{LoginService, RevocationList, TokenService, UserDirectory};
use factnotes_server::{
    api,
    auth::{AppState, FacebookProvider},
    config::ServerConfig,
    db::{PgSummaryStore, PgUserStore},
    summarizer::HttpSummarizer,
};
use sqlx::postgres::PgPoolOptions;
use std::{error::Error, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env()?;
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let revocations = RevocationList::new();
    let tokens = TokenService::new(&config.token, revocations.clone())
        .map_err(|e| format!("invalid token configuration: {e}"))?;

    let backend = Arc::new(MemoryCacheBackend::new(config.cache.max_entries));
    let cache = CacheAsideStore::new(backend.clone());

    let directory = UserDirectory::new(
        Arc::new(PgUserStore::new(db_pool.clone())),
        cache.clone(),
        revocations.clone(),
    )
    .with_ttl(config.cache.user_ttl());

    // Credentials revoked before a restart must stay revoked.
    let restored = directory
        .restore_revocations(chrono::Utc::now() - tokens.ttl())
        .await
        .map_err(|e| format!("failed to restore revocations: {e}"))?;
    tracing::info!(restored, "Restored revocation watermarks");

    let provider = FacebookProvider::new(&config.facebook)?;
    let login = LoginService::new(Arc::new(provider), directory.clone(), tokens.clone());

    let summary_store = Arc::new(PgSummaryStore::new(db_pool.clone()));
    let (queue, receiver) = SummarizationQueue::channel(config.summarizer.pool.queue_capacity);
    let workflow = ModerationWorkflow::new(summary_store.clone(), cache, Arc::new(queue))
        .with_ttl(config.cache.summary_ttl());

    match config.summarizer.endpoint.as_deref() {
        Some(endpoint) => {
            let summarizer = HttpSummarizer::new(endpoint)?;
            let workers = SummarizationQueue::spawn_workers(
                &config.summarizer.pool,
                receiver,
                Arc::new(summarizer),
                Arc::new(workflow.clone()),
            );
            tracing::info!(
                workers = workers.len(),
                endpoint,
                "Started summarization workers"
            );
        }
        None => {
            // Closing the queue makes submissions skip summarization.
            drop(receiver);
            tracing::warn!("No summarizer endpoint configured; summaries stay pending");
        }
    }

    let links = ResourceLinkRegistry::new(summary_store);

    // Spawn periodic sweep of expired cache entries and stale revocations
    let sweep_interval = Duration::from_secs(config.cache.sweep_interval_seconds.max(1));
    let token_ttl = tokens.ttl();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let purged = backend.purge_expired();
            let pruned = revocations.prune(chrono::Utc::now() - token_ttl);
            if purged > 0 || pruned > 0 {
                tracing::debug!(
                    purged_entries = purged,
                    pruned_revocations = pruned,
                    "Periodic sweep"
                );
            }
        }
    });

    let state = Arc::new(AppState {
        tokens,
        login,
        directory,
        workflow,
        links,
    });
    let app = api::router(state);

    tracing::info!(address = %config.bind_address, "Listening");
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
