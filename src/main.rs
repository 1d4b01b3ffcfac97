use anyhow::{Context, Result};
use civic_translation_cache::api::{self, AppState};
use civic_translation_cache::config::Config;
use civic_translation_cache::i18n::Locale;
use civic_translation_cache::retry::{with_retry, Backoff};
use civic_translation_cache::translation::{
    CacheStore, HttpTranslationProvider, InMemoryCacheStore, PgCacheStore, Translator,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("civic_translation_cache=info".parse()?),
        )
        .init();

    info!("Starting translation cache service");

    let config = Config::from_env()?;
    info!(
        "Source locale: {}, targets: {}",
        Locale::SOURCE,
        Locale::ALL
            .iter()
            .filter(|locale| !locale.is_source())
            .map(Locale::code)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let store: Arc<dyn CacheStore> = match &config.database_url {
        Some(url) => {
            info!("Connecting to translation store");
            let store = with_retry(&Backoff::database_connect(), "Database connect", || {
                PgCacheStore::connect(url)
            })
            .await
            .context("Failed to connect to translation store")?;
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, translations will not survive a restart");
            Arc::new(InMemoryCacheStore::new())
        }
    };

    let provider = HttpTranslationProvider::from_config(&config)
        .context("Failed to build translation provider")?;

    let translator = Arc::new(
        Translator::builder(Arc::new(provider), store)
            .memo_capacity(config.memo_cache_capacity)
            .write_queue_capacity(config.write_queue_capacity)
            .single_flight(config.single_flight)
            .build(),
    );

    let app = api::router(AppState::new(Arc::clone(&translator)));
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Flushing pending cache writes");
    translator.flush().await;
    info!("{}", translator.metrics().format());

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
