use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Per-IP rate limiter for the redirect path.
///
/// Keys on the connection peer address, which can't be forged by a
/// client header. Requests without connection info (direct router
/// invocations) share a single fallback key.
pub struct RedirectRateLimiter {
    limiter: RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>,
}

impl RedirectRateLimiter {
    pub fn per_minute(limit: NonZeroU32) -> Self {
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(limit)),
        }
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }
}

pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RedirectRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check(ip) {
        next.run(request).await
    } else {
        tracing::warn!(client_ip = %ip, "rate limit exceeded on redirect");
        (StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_keys_on_ip() {
        let limiter = RedirectRateLimiter::per_minute(NonZeroU32::new(2).unwrap());
        let a = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 1));
        let b = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 2));

        assert!(limiter.check(a));
        assert!(limiter.check(a));
        assert!(!limiter.check(a), "third burst request must be rejected");

        // An unrelated client is not throttled by a's burst.
        assert!(limiter.check(b));
    }
}
