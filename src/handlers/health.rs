use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// The response payload for the health endpoint.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: DateTime<Utc>,
    pub services: ServicesStatus,
}

#[derive(Serialize)]
pub struct ServicesStatus {
    pub redis: bool,
    pub gateway: &'static str,
}

/// Handles the health check endpoint.
///
/// Always answers 200 while the process is serving; the Redis flag reports
/// cache reachability without failing the check. The external checker only
/// cares about status and latency (2-second budget).
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let pong: Result<String, redis::RedisError> = redis::cmd("PING")
        .query_async(&mut state.redis.clone())
        .await;

    Json(HealthResponse {
        status: "healthy",
        service: "api-gateway",
        timestamp: Utc::now(),
        services: ServicesStatus {
            redis: pong.is_ok(),
            gateway: "running",
        },
    })
}
