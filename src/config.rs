use anyhow::{Context, Result};
use std::env;

/// Base URLs of the backend services the gateway fronts.
///
/// Defaults point at the in-cluster hostnames used by the compose/k8s
/// deployment; each can be overridden with its `*_SERVICE_URL` variable.
#[derive(Clone, Debug)]
pub struct ServiceUrls {
    pub user: String,
    pub workout: String,
    pub ai: String,
    pub analytics: String,
    pub notification: String,
}

impl ServiceUrls {
    fn from_env() -> Self {
        Self {
            user: env::var("USER_SERVICE_URL")
                .unwrap_or_else(|_| "http://user-service:3001".to_string()),
            workout: env::var("WORKOUT_SERVICE_URL")
                .unwrap_or_else(|_| "http://workout-service:3002".to_string()),
            ai: env::var("AI_SERVICE_URL")
                .unwrap_or_else(|_| "http://ai-service:5000".to_string()),
            analytics: env::var("ANALYTICS_SERVICE_URL")
                .unwrap_or_else(|_| "http://analytics-service:3003".to_string()),
            notification: env::var("NOTIFICATION_SERVICE_URL")
                .unwrap_or_else(|_| "http://notification-service:3004".to_string()),
        }
    }
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The port the gateway listens on.
    pub port: u16,
    /// The shared secret used to verify bearer tokens.
    pub jwt_secret: String,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The base URLs of the proxied backend services.
    pub services: ServiceUrls,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .context("JWT_SECRET must be set (shared with the user service)")?;

        if jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            jwt_secret,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            services: ServiceUrls::from_env(),
        })
    }
}
