use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::models::{ShortenRequest, ShortenResponse, StatsResponse};
use crate::service::{ServiceError, ShortenerService};
use crate::validation::UrlValidator;

pub struct AppState {
    pub service: Arc<ShortenerService>,
    pub validator: UrlValidator,
    pub base_url: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn map_service_error(err: ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        ServiceError::NotFound => error_response(StatusCode::NOT_FOUND, "URL not found"),
        ServiceError::CodeSpaceExhausted(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        ServiceError::Store(err) => {
            tracing::error!(error = %err, "store failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Shorten a URL. Returns 201 for a newly created mapping, 200 when
/// the URL was already shortened.
pub async fn shorten_url(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), (StatusCode, Json<ErrorResponse>)> {
    let sanitized = state.validator.sanitize(&payload.url);
    let original_url = state
        .validator
        .validate(&sanitized)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    let shortened = state
        .service
        .shorten(&original_url)
        .await
        .map_err(map_service_error)?;

    let status = if shortened.is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let record = shortened.record;
    Ok((
        status,
        Json(ShortenResponse {
            short_url: format!("{}/{}", state.base_url, record.short_code),
            short_code: record.short_code,
            original_url: record.original_url,
            created_at: record.created_at,
            is_new: shortened.is_new,
        }),
    ))
}

/// Click statistics for a short code.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<StatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let record = state.service.stats(&code).await.map_err(map_service_error)?;
    Ok(Json(StatsResponse::from_record(record)))
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
