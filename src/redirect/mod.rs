mod handlers;
mod middleware;
mod routes;

pub use handlers::RedirectState;
pub use middleware::RedirectRateLimiter;
pub use routes::create_redirect_router;
