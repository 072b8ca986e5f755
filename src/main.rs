use std::{net::SocketAddr, sync::Arc, time::Duration};

use nextup_api::{
    config::{CacheBackend, Config},
    db::{
        create_pool, create_redis_client, run_migrations, CacheStore, CacheWriterHandle,
        MemoryStore, PgContentRepository, PgLibrarySource, RedisStore, ResultCache,
    },
    routes::{create_router, AppState},
    services::{PineconeIndex, Recommender, RecommenderSettings, VectorSimilarity},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nextup_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let (store, cache_writer): (Arc<dyn CacheStore>, Option<CacheWriterHandle>) =
        match config.cache_backend {
            CacheBackend::Redis => {
                let client = create_redis_client(&config.redis_url)?;
                let (store, handle) = RedisStore::new(client);
                (Arc::new(store) as Arc<dyn CacheStore>, Some(handle))
            }
            CacheBackend::Memory => {
                let store = MemoryStore::new(config.memory_cache_max_entries);
                (Arc::new(store) as Arc<dyn CacheStore>, None)
            }
        };

    let call_timeout = Duration::from_secs(config.external_call_timeout_secs);
    let cache = ResultCache::new(
        store,
        config.vector_cache_ttl_secs,
        config.result_cache_ttl_secs,
        call_timeout,
    );
    tracing::info!(backend = ?config.cache_backend, "Result cache ready");

    let index = PineconeIndex::new(
        config.pinecone_api_key.clone(),
        config.pinecone_index_host.clone(),
    );
    let similarity = VectorSimilarity::new(Arc::new(index), cache.clone(), call_timeout);

    let recommender = Recommender::new(
        Arc::new(PgContentRepository::new(pool.clone())),
        Arc::new(PgLibrarySource::new(pool)),
        similarity,
        cache,
        RecommenderSettings {
            call_timeout,
            min_library_size: config.min_library_size,
        },
    );

    let app = create_router(AppState::new(recommender, config.default_top_k));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
