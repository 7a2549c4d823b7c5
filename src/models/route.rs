use crate::config::Config;

/// A static mapping from a public path prefix to a backend service.
#[derive(Debug, Clone)]
pub struct RouteRule {
    /// The public path prefix, e.g. `/api/workouts`.
    pub prefix: String,
    /// The base URL of the backend service.
    pub target: String,
    /// The service-side prefix the public prefix is rewritten to.
    pub rewrite: String,
    /// Whether a valid bearer token is required on this prefix.
    pub auth_required: bool,
}

impl RouteRule {
    fn new(prefix: &str, target: &str, rewrite: &str, auth_required: bool) -> Self {
        Self {
            prefix: prefix.to_string(),
            target: target.to_string(),
            rewrite: rewrite.to_string(),
            auth_required,
        }
    }

    /// Rewrites a matched public path to the service-side path.
    ///
    /// The caller guarantees `path` starts with `self.prefix`; the prefix is
    /// replaced exactly once and the remainder is kept verbatim.
    pub fn rewrite_path(&self, path: &str) -> String {
        let remainder = &path[self.prefix.len()..];
        format!("{}{}", self.rewrite, remainder)
    }
}

/// The gateway's routing table, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Builds the routing table from the configured service URLs.
    pub fn from_config(config: &Config) -> Self {
        let s = &config.services;
        Self {
            rules: vec![
                RouteRule::new("/api/auth", &s.user, "/auth", false),
                RouteRule::new("/api/public", &s.workout, "/public", false),
                RouteRule::new("/api/users", &s.user, "/users", true),
                RouteRule::new("/api/workouts", &s.workout, "/workouts", true),
                RouteRule::new("/api/ai", &s.ai, "/ai", true),
                RouteRule::new("/api/analytics", &s.analytics, "/analytics", true),
                RouteRule::new("/api/notifications", &s.notification, "/notifications", true),
            ],
        }
    }

    /// Finds the longest-prefix rule matching `path`, if any.
    ///
    /// Matches respect path-segment boundaries: `/api/users` matches
    /// `/api/users` and `/api/users/42` but not `/api/usersx`.
    pub fn match_path(&self, path: &str) -> Option<&RouteRule> {
        self.rules
            .iter()
            .filter(|rule| {
                path.strip_prefix(rule.prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
            .max_by_key(|rule| rule.prefix.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceUrls;

    fn table() -> RouteTable {
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

    #[test]
    fn matches_protected_prefix() {
        let table = table();
        let rule = table.match_path("/api/workouts/stats").unwrap();
        assert_eq!(rule.target, "http://workout-service:3002");
        assert!(rule.auth_required);
    }

    #[test]
    fn matches_public_prefix() {
        let table = table();
        let rule = table.match_path("/api/auth/login").unwrap();
        assert_eq!(rule.target, "http://user-service:3001");
        assert!(!rule.auth_required);
    }

    #[test]
    fn matches_bare_prefix() {
        let table = table();
        let rule = table.match_path("/api/users").unwrap();
        assert_eq!(rule.rewrite_path("/api/users"), "/users");
    }

    #[test]
    fn rejects_unknown_path() {
        let table = table();
        assert!(table.match_path("/api/unknown").is_none());
        assert!(table.match_path("/health").is_none());
        assert!(table.match_path("/").is_none());
    }

    #[test]
    fn respects_segment_boundary() {
        let table = table();
        assert!(table.match_path("/api/usersx").is_none());
        assert!(table.match_path("/api/authx/login").is_none());
    }

    #[test]
    fn rewrites_prefix_exactly_once() {
        let table = table();
        let rule = table.match_path("/api/workouts/stats").unwrap();
        assert_eq!(rule.rewrite_path("/api/workouts/stats"), "/workouts/stats");

        // A path whose remainder repeats the public prefix stays intact.
        let rule = table.match_path("/api/users/api/users").unwrap();
        assert_eq!(rule.rewrite_path("/api/users/api/users"), "/users/api/users");
    }
}
