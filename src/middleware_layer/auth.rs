use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, Result},
    models::route::RouteTable,
    services::token,
    state::AppState,
};

/// Decides what authentication a request needs, before touching Redis.
///
/// Public prefixes and paths outside the routing table need nothing
/// (`Ok(None)`); an auth-required prefix yields the bearer token to
/// validate, or `MissingToken` when the header is absent — in which case
/// the request is rejected before any backend call.
fn token_to_validate(routes: &RouteTable, path: &str, headers: &HeaderMap) -> Result<Option<String>> {
    let auth_required = routes
        .match_path(path)
        .is_some_and(|rule| rule.auth_required);

    if !auth_required {
        return Ok(None);
    }

    token::extract_bearer(headers)
        .map(|t| Some(t.to_string()))
        .ok_or(AppError::MissingToken)
}

/// A middleware that validates the bearer token on auth-required prefixes.
///
/// Public prefixes and paths outside the routing table pass through
/// untouched; the dispatcher handles unmatched paths with a 404. On an
/// auth-required prefix the token must decode, be unexpired, and be absent
/// from the revocation set; the verified `Identity` is attached to the
/// request extensions for the dispatcher to forward.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an error `AppError`.
pub async fn authenticate(
    State(mut state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    if let Some(token) =
        token_to_validate(&state.routes, request.uri().path(), request.headers())?
    {
        tracing::debug!("🔐 Checking authentication...");

        let identity =
            token::validate(&mut state.redis, &state.config.jwt_secret, &token).await?;

        tracing::debug!("✅ User authenticated: {}", identity.user_id);
        request.extensions_mut().insert(identity);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ServiceUrls};
    use axum::http::HeaderValue;

    fn routes() -> RouteTable {
        let config = Config {
            port: 3000,
            jwt_secret: "test-secret".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            services: ServiceUrls {
                user: "http://user-service:3001".to_string(),
                workout: "http://workout-service:3002".to_string(),
                ai: "http://ai-service:5000".to_string(),
                analytics: "http://analytics-service:3003".to_string(),
                notification: "http://notification-service:3004".to_string(),
            },
        };
        RouteTable::from_config(&config)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn protected_prefix_without_token_is_rejected() {
        let routes = routes();
        assert!(matches!(
            token_to_validate(&routes, "/api/workouts/stats", &HeaderMap::new()),
            Err(AppError::MissingToken)
        ));
    }

    #[test]
    fn protected_prefix_with_token_demands_validation() {
        let routes = routes();
        let decision = token_to_validate(&routes, "/api/users", &bearer("abc.def.ghi")).unwrap();
        assert_eq!(decision, Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn public_prefix_passes_without_token() {
        let routes = routes();
        assert_eq!(
            token_to_validate(&routes, "/api/auth/login", &HeaderMap::new()).unwrap(),
            None
        );
        assert_eq!(
            token_to_validate(&routes, "/api/public/plans", &HeaderMap::new()).unwrap(),
            None
        );
    }

    #[test]
    fn public_prefix_ignores_a_present_token() {
        let routes = routes();
        assert_eq!(
            token_to_validate(&routes, "/api/auth/login", &bearer("abc")).unwrap(),
            None
        );
    }

    #[test]
    fn unmatched_path_passes_through() {
        let routes = routes();
        assert_eq!(
            token_to_validate(&routes, "/api/unknown", &HeaderMap::new()).unwrap(),
            None
        );
        assert_eq!(
            token_to_validate(&routes, "/health", &HeaderMap::new()).unwrap(),
            None
        );
    }
}
