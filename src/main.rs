use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinemeteo::{
    config::{CacheBackend, Config},
    db::{create_redis_client, Cache, CacheStore, MemoryCache, RedisCache},
    routes::{create_router, AppState},
    services::{
        providers::{OpenAiProvider, OpenWeatherProvider, TmdbProvider},
        MovieEnricher, RecommendationGenerator, RecommendationService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinemeteo=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let timeout = config.http_timeout();

    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Redis => {
            let redis = RedisCache::new(create_redis_client(&config.redis_url)?, timeout);
            // Startup proceeds without Redis; the cache reconnects on demand.
            redis.connect().await;
            Arc::new(redis)
        }
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
    };
    let cache = Cache::new(store);

    let weather = OpenWeatherProvider::new(
        config.openweather_api_key.clone(),
        config.openweather_api_url.clone(),
        timeout,
    )?;
    let model = OpenAiProvider::new(
        config.openai_api_key.clone(),
        config.openai_api_url.clone(),
        config.openai_model.clone(),
        timeout,
    )?;
    let movies = TmdbProvider::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        timeout,
    )?;

    let openai = model.clone();
    tokio::spawn(async move {
        openai.check_connection().await;
    });

    let service = RecommendationService::new(
        Arc::new(weather),
        RecommendationGenerator::new(Arc::new(model), config.recommendation_policy),
        MovieEnricher::new(
            Arc::new(movies),
            cache.clone(),
            config.tmdb_image_base_url.clone(),
        ),
        cache,
    );

    let allowed_origins = config.allowed_origins();
    let app = create_router(Arc::new(AppState::new(service)), &allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %config.bind_address(),
        cache = ?config.cache_backend,
        policy = ?config.recommendation_policy,
        origins = ?allowed_origins,
        "Server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
