use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    response::Response,
};

use crate::{
    error::{AppError, Result},
    models::{identity::Identity, route::RouteRule},
    state::AppState,
};

/// Maximum request body the gateway will relay (10 MB, matching the
/// original deployment's JSON body limit).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Returns `true` for headers that must never be relayed across the proxy:
/// hop-by-hop headers plus `Host`, which reqwest derives from the target URL.
pub fn skip_when_forwarding(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "host"
            | "content-length"
    )
}

/// The identity header pair is owned by the gateway: inbound values are
/// always dropped so an unauthenticated caller cannot forge an identity to
/// backends that trust these headers.
const IDENTITY_HEADERS: [&str; 2] = ["x-user-id", "x-user-email"];

/// Builds the outbound header set: inbound headers minus hop-by-hop and
/// identity ones, plus the identity pair when the request is authenticated.
pub fn forward_headers(inbound: &HeaderMap, identity: Option<&Identity>) -> HeaderMap {
    let mut outbound = HeaderMap::new();

    for (name, value) in inbound {
        if skip_when_forwarding(name) || IDENTITY_HEADERS.contains(&name.as_str()) {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }

    if let Some(identity) = identity {
        outbound.insert("x-user-id", HeaderValue::from(identity.user_id));
        match HeaderValue::from_str(&identity.email) {
            Ok(value) => {
                outbound.insert("x-user-email", value);
            }
            Err(_) => {
                tracing::warn!(
                    "Email for user {} is not a valid header value, omitting",
                    identity.user_id
                );
            }
        }
    }

    outbound
}

/// Builds the upstream URL for a matched rule, preserving the query string.
pub fn upstream_url(rule: &RouteRule, path: &str, query: Option<&str>) -> String {
    let rewritten = rule.rewrite_path(path);
    match query {
        Some(q) => format!("{}{}?{}", rule.target, rewritten, q),
        None => format!("{}{}", rule.target, rewritten),
    }
}

/// Forwards a request to the backend service selected by `rule`.
///
/// A single attempt, no retry: any connect/timeout/IO failure surfaces as
/// `UpstreamUnavailable` with a generic client message. The upstream status
/// and body stream back unchanged apart from hop-by-hop headers.
pub async fn forward(state: &AppState, rule: &RouteRule, req: Request<Body>) -> Result<Response> {
    let identity = req.extensions().get::<Identity>().cloned();

    if rule.auth_required && identity.is_none() {
        return Err(AppError::Unauthorized);
    }

    let (parts, body) = req.into_parts();
    let url = upstream_url(rule, parts.uri.path(), parts.uri.query());
    let headers = forward_headers(&parts.headers, identity.as_ref());

    let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read request body: {}", e)))?;

    tracing::debug!("➡️  {} {} -> {}", parts.method, parts.uri.path(), url);

    let upstream = state
        .http
        .request(parts.method, url)
        .headers(headers)
        .body(body_bytes)
        .send()
        .await
        .map_err(|e| AppError::UpstreamUnavailable(format!("{}: {}", rule.target, e)))?;

    let mut builder = Response::builder().status(upstream.status());
    for (name, value) in upstream.headers() {
        if !skip_when_forwarding(name) {
            builder = builder.header(name.clone(), value.clone());
        }
    }

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> RouteRule {
        RouteRule {
            prefix: "/api/workouts".to_string(),
            target: "http://workout-service:3002".to_string(),
            rewrite: "/workouts".to_string(),
            auth_required: true,
        }
    }

    #[test]
    fn upstream_url_rewrites_and_keeps_query() {
        let rule = rule();
        assert_eq!(
            upstream_url(&rule, "/api/workouts/stats", None),
            "http://workout-service:3002/workouts/stats"
        );
        assert_eq!(
            upstream_url(&rule, "/api/workouts", Some("page=2&limit=10")),
            "http://workout-service:3002/workouts?page=2&limit=10"
        );
    }

    #[test]
    fn identity_headers_are_injected() {
        let inbound = HeaderMap::new();
        let identity = Identity {
            user_id: 42,
            email: "a@b.com".to_string(),
        };
        let out = forward_headers(&inbound, Some(&identity));
        assert_eq!(out.get("x-user-id").unwrap(), "42");
        assert_eq!(out.get("x-user-email").unwrap(), "a@b.com");
    }

    #[test]
    fn no_identity_headers_without_identity() {
        let out = forward_headers(&HeaderMap::new(), None);
        assert!(out.get("x-user-id").is_none());
        assert!(out.get("x-user-email").is_none());
    }

    #[test]
    fn client_supplied_identity_headers_are_dropped_on_public_routes() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-user-id", HeaderValue::from_static("999"));
        inbound.insert("x-user-email", HeaderValue::from_static("evil@b.com"));

        let out = forward_headers(&inbound, None);
        assert!(out.get("x-user-id").is_none());
        assert!(out.get("x-user-email").is_none());
    }

    #[test]
    fn client_supplied_identity_headers_cannot_override_the_verified_identity() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-user-id", HeaderValue::from_static("999"));
        inbound.insert("x-user-email", HeaderValue::from_static("evil@b.com"));

        let identity = Identity {
            user_id: 42,
            email: "a@b.com".to_string(),
        };
        let out = forward_headers(&inbound, Some(&identity));
        assert_eq!(out.get("x-user-id").unwrap(), "42");
        assert_eq!(out.get("x-user-email").unwrap(), "a@b.com");
        assert_eq!(out.get_all("x-user-id").iter().count(), 1);
    }

    #[test]
    fn hop_by_hop_headers_are_stripped() {
        let mut inbound = HeaderMap::new();
        inbound.insert("connection", HeaderValue::from_static("keep-alive"));
        inbound.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        inbound.insert("upgrade", HeaderValue::from_static("websocket"));
        inbound.insert("host", HeaderValue::from_static("gateway:3000"));
        inbound.insert("content-type", HeaderValue::from_static("application/json"));
        inbound.insert("authorization", HeaderValue::from_static("Bearer abc"));

        let out = forward_headers(&inbound, None);
        assert!(out.get("connection").is_none());
        assert!(out.get("transfer-encoding").is_none());
        assert!(out.get("upgrade").is_none());
        assert!(out.get("host").is_none());
        assert_eq!(out.get("content-type").unwrap(), "application/json");
        assert_eq!(out.get("authorization").unwrap(), "Bearer abc");
    }
}
