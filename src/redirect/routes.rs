use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use super::handlers::{redirect_url, RedirectState};
use super::middleware::{enforce_rate_limit, RedirectRateLimiter};

pub fn create_redirect_router(
    state: Arc<RedirectState>,
    rate_limiter: Option<Arc<RedirectRateLimiter>>,
) -> Router {
    let router = Router::new()
        .route("/{code}", get(redirect_url))
        .with_state(state);

    match rate_limiter {
        Some(limiter) => {
            router.layer(middleware::from_fn_with_state(limiter, enforce_rate_limit))
        }
        None => router,
    }
}
