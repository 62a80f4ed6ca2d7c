use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::service::DEFAULT_MAX_RETRIES;
use crate::shortener::DEFAULT_CODE_LENGTH;
use crate::validation::DEFAULT_MAX_URL_LENGTH;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub shortener: ShortenerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    pub ttl_secs: u64,
    pub max_entries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL used when rendering short links in API responses.
    pub base_url: String,
    /// Allowed CORS origins for the JSON API.
    pub cors_origins: Vec<String>,
    /// Per-IP request budget for the redirect path. Zero disables
    /// rate limiting.
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenerConfig {
    pub code_length: usize,
    pub max_retries: u32,
    pub max_url_length: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());
        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./tinylink.db".to_string());
        let max_connections = env_parse("DATABASE_MAX_CONNECTIONS", 20u32)?;

        let cache_backend_str =
            std::env::var("CACHE_BACKEND").unwrap_or_else(|_| "memory".to_string());
        let cache_backend = match cache_backend_str.to_lowercase().as_str() {
            "redis" => CacheBackend::Redis,
            "memory" => CacheBackend::Memory,
            other => {
                tracing::warn!(
                    "Unknown CACHE_BACKEND '{other}', falling back to 'memory'. Supported values: memory, redis"
                );
                CacheBackend::Memory
            }
        };

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379/0".to_string());
        // 24 hours, matching the redirect cache's intended lifetime
        let ttl_secs = env_parse("CACHE_TTL_SECS", 86_400u64)?;
        let max_entries = env_parse("CACHE_MAX_ENTRIES", 100_000u64)?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_parse("PORT", 8080u16)?;
        let base_url =
            std::env::var("BASE_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:8000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let rate_limit_per_minute = env_parse("RATE_LIMIT_PER_MINUTE", 100u32)?;

        let code_length = env_parse("SHORT_CODE_LENGTH", DEFAULT_CODE_LENGTH)?;
        let max_retries = env_parse("MAX_COLLISION_RETRIES", DEFAULT_MAX_RETRIES)?;
        let max_url_length = env_parse("MAX_URL_LENGTH", DEFAULT_MAX_URL_LENGTH)?;

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            cache: CacheConfig {
                backend: cache_backend,
                redis_url,
                ttl_secs,
                max_entries,
            },
            server: ServerConfig {
                host,
                port,
                base_url,
                cors_origins,
                rate_limit_per_minute,
            },
            shortener: ShortenerConfig {
                code_length,
                max_retries,
                max_url_length,
            },
        })
    }
}

fn env_parse<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("invalid value for {name}: '{value}'")),
        Err(_) => Ok(default),
    }
}
