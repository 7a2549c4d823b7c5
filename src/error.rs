use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// No bearer token was presented on an auth-required route.
    #[error("Access token required")]
    MissingToken,

    /// The token failed signature, expiry, or shape validation.
    #[error("Invalid token")]
    InvalidToken,

    /// The token is present in the revocation set.
    #[error("Token is invalid")]
    Revoked,

    /// An authorization error.
    #[error("Authorization failed")]
    Unauthorized,

    /// No route rule matches the request path.
    #[error("Route not found")]
    RouteNotFound,

    /// The backend service was unreachable or timed out.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The AI analysis call failed.
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    /// A rate limit exceeded error.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Cache error".to_string())
            }

            AppError::MissingToken => {
                tracing::warn!("Request without access token");
                (StatusCode::UNAUTHORIZED, "Access token required".to_string())
            }

            AppError::InvalidToken => {
                tracing::warn!("Token verification failed");
                (StatusCode::FORBIDDEN, "Invalid token".to_string())
            }

            AppError::Revoked => {
                tracing::warn!("Revoked token presented");
                (StatusCode::UNAUTHORIZED, "Token is invalid".to_string())
            }

            AppError::Unauthorized => {
                tracing::warn!("Authorization failed");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }

            AppError::RouteNotFound => {
                tracing::debug!("Route not found");
                (StatusCode::NOT_FOUND, "Route not found".to_string())
            }

            AppError::UpstreamUnavailable(ref detail) => {
                tracing::error!("Upstream unavailable: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    "Service temporarily unavailable".to_string(),
                )
            }

            AppError::AnalysisFailed(ref detail) => {
                tracing::error!("Frame analysis error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    "Analysis temporarily unavailable".to_string(),
                )
            }

            AppError::RateLimitExceeded(ref msg) => {
                tracing::warn!("Rate limit exceeded: {}", msg);
                (StatusCode::TOO_MANY_REQUESTS, msg.clone())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (
            status,
            [(http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
