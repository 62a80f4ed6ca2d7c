use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored short-code to URL mapping.
///
/// `short_code` and `original_url` are both unique at the store level,
/// so the mapping is a bijection. `click_count` only ever increases and
/// `last_accessed_at` stays `None` until the first successful resolve.
/// Timestamps are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UrlRecord {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub created_at: i64,
    pub click_count: i64,
    pub last_accessed_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: i64,
    pub is_new: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub short_code: String,
    pub original_url: String,
    pub click_count: i64,
    pub created_at: i64,
    pub last_accessed_at: Option<i64>,
}

impl StatsResponse {
    pub fn from_record(record: UrlRecord) -> Self {
        Self {
            short_code: record.short_code,
            original_url: record.original_url,
            click_count: record.click_count,
            created_at: record.created_at,
            last_accessed_at: record.last_accessed_at,
        }
    }
}
