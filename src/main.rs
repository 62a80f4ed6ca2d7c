use anyhow::Result;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tinylink::api::{create_api_router, create_cors_layer, AppState};
use tinylink::cache::{MokaCache, RedisCache, UrlCache};
use tinylink::config::{CacheBackend, Config, DatabaseBackend};
use tinylink::redirect::{create_redirect_router, RedirectRateLimiter, RedirectState};
use tinylink::service::ShortenerService;
use tinylink::shortener::CodeGenerator;
use tinylink::storage::{PostgresStorage, SqliteStorage, Storage};
use tinylink::validation::UrlValidator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(
                SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(
                PostgresStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
    };

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    let ttl = Duration::from_secs(config.cache.ttl_secs);
    let cache: Arc<dyn UrlCache> = match config.cache.backend {
        CacheBackend::Memory => {
            info!("Using in-process cache (ttl: {}s)", config.cache.ttl_secs);
            Arc::new(MokaCache::new(config.cache.max_entries, ttl))
        }
        CacheBackend::Redis => {
            info!(
                "Using Redis cache: {} (ttl: {}s)",
                config.cache.redis_url, config.cache.ttl_secs
            );
            Arc::new(RedisCache::connect(&config.cache.redis_url, ttl).await?)
        }
    };

    let generator = Arc::new(CodeGenerator::new(config.shortener.code_length));
    let service = Arc::new(ShortenerService::new(
        Arc::clone(&storage),
        cache,
        generator,
        config.shortener.max_retries,
    ));

    let api_state = Arc::new(AppState {
        service: Arc::clone(&service),
        validator: UrlValidator::new(config.shortener.max_url_length),
        base_url: config.server.base_url.clone(),
    });
    let redirect_state = Arc::new(RedirectState {
        service: Arc::clone(&service),
    });

    let rate_limiter = NonZeroU32::new(config.server.rate_limit_per_minute)
        .map(|limit| Arc::new(RedirectRateLimiter::per_minute(limit)));
    match &rate_limiter {
        Some(_) => info!(
            "Rate limiting redirects at {} requests/minute per IP",
            config.server.rate_limit_per_minute
        ),
        None => info!("Redirect rate limiting is disabled"),
    }

    let app = create_api_router(api_state)
        .merge(create_redirect_router(redirect_state, rate_limiter))
        .layer(create_cors_layer(&config.server.cors_origins));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);
    info!("   - POST http://{}/api/shorten", addr);
    info!("   - GET  http://{}/api/stats/{{code}}", addr);
    info!("   - GET  http://{}/{{code}}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
