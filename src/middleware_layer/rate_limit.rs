use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::{error::AppError, state::AppState};

/// Maximum requests per client IP per window.
const RATE_LIMIT_MAX: i64 = 100;
/// Fixed window length: 15 minutes.
const RATE_LIMIT_WINDOW_SECS: i64 = 15 * 60;

/// Whether the window TTL must be (re)armed after an INCR.
///
/// The first hit in a window arms the TTL. A TTL of -1 means the key
/// exists without one (the EXPIRE that should have armed it was lost to a
/// fail-open Redis error), which would otherwise rate limit the IP
/// forever once it crosses the threshold; re-arming bounds the damage to
/// a single window.
fn must_arm_ttl(count: i64, ttl: i64) -> bool {
    count == 1 || ttl == -1
}

/// Extracts the real IP address from the request extensions.
///
/// # Arguments
///
/// * `req` - The incoming request.
///
/// # Returns
///
/// The IP address as a string, or "unknown" if not found.
fn extract_real_ip(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// A middleware that rate limits requests per client IP.
///
/// Fixed window counter in Redis, enforced independently per gateway
/// instance. Redis failures fail open: a broken cache must not take the
/// whole gateway down with it.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `req` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response`.
pub async fn rate_limit_by_ip(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = extract_real_ip(&req);
    let key = format!("rate_limit:ip:{}", ip);

    let count: i64 = redis::cmd("INCR")
        .arg(&key)
        .query_async(&mut state.redis.clone())
        .await
        .unwrap_or(0);

    // Only subsequent hits read the TTL; a fresh key never has one yet.
    let ttl: i64 = if count == 1 {
        -1
    } else {
        redis::cmd("TTL")
            .arg(&key)
            .query_async(&mut state.redis.clone())
            .await
            .unwrap_or(RATE_LIMIT_WINDOW_SECS)
    };

    if must_arm_ttl(count, ttl) {
        let _: () = redis::cmd("EXPIRE")
            .arg(&key)
            .arg(RATE_LIMIT_WINDOW_SECS)
            .query_async(&mut state.redis.clone())
            .await
            .unwrap_or(());
    }

    if count > RATE_LIMIT_MAX {
        return AppError::RateLimitExceeded(
            "Too many requests from this IP, please try again later.".to_string(),
        )
        .into_response();
    }

    next.run(req).await
}
