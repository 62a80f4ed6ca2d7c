use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;

use crate::service::{ServiceError, ShortenerService};

pub struct RedirectState {
    pub service: Arc<ShortenerService>,
}

/// Redirect to the original URL with a 307, so clients re-resolve on
/// every visit and clicks keep counting.
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    match state.service.resolve(&code).await {
        Ok(original_url) => Redirect::temporary(&original_url).into_response(),
        Err(ServiceError::NotFound) => (StatusCode::NOT_FOUND, "URL not found").into_response(),
        Err(err) => {
            tracing::error!(short_code = %code, error = %err, "redirect failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
