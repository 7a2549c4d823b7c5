use axum::http::HeaderMap;
use jsonwebtoken::{DecodingKey, Validation, decode};
use redis::aio::ConnectionManager;

use crate::{
    error::{AppError, Result},
    models::identity::{Claims, Identity},
};

/// Redis key for a revoked token.
///
/// Entries are written by the user service at logout with their own TTL;
/// the gateway only ever reads them.
pub fn revocation_key(token: &str) -> String {
    format!("blacklist:{}", token)
}

/// Extracts the bearer token from a standard authorization header.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// Decodes and verifies a bearer token against the shared secret.
///
/// Signature, expiry, or shape failure all collapse into `InvalidToken`;
/// the concrete reason is only logged.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("Token verification failed: {}", e);
            AppError::InvalidToken
        })
}

/// Validates a bearer token: signature, expiry, then the revocation set.
///
/// Read-only; revocation entries are written elsewhere.
///
/// # Returns
///
/// A `Result` containing the verified `Identity`.
pub async fn validate(
    redis: &mut ConnectionManager,
    secret: &str,
    token: &str,
) -> Result<Identity> {
    let claims = decode_token(token, secret)?;

    let revoked: bool = redis::cmd("EXISTS")
        .arg(revocation_key(token))
        .query_async(redis)
        .await?;

    if revoked {
        return Err(AppError::Revoked);
    }

    tracing::debug!("✅ Token validated for user: {}", claims.user_id);
    Ok(claims.into())
}
