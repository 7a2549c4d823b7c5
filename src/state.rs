use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::event::ServerEvent;
use crate::models::route::RouteTable;

/// Timeout for a single proxied upstream call, in seconds.
pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;

struct Channel {
    conn_id: Uuid,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

/// The registry of live realtime channels.
///
/// At most one channel exists per identity: registering a new connection
/// replaces the previous one (last connection wins). Rooms hold named
/// broadcast groups; every connection joins `user_{id}` on connect.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    channels: Arc<RwLock<HashMap<i64, Channel>>>,
    rooms: Arc<RwLock<HashMap<String, HashMap<Uuid, mpsc::UnboundedSender<ServerEvent>>>>>,
}

impl ChannelRegistry {
    /// Binds a connection to an identity, replacing any previous binding.
    pub async fn register(&self, user_id: i64, conn_id: Uuid, tx: mpsc::UnboundedSender<ServerEvent>) {
        self.channels
            .write()
            .await
            .insert(user_id, Channel { conn_id, tx });
    }

    /// Removes the binding for an identity, but only if `conn_id` still
    /// owns it. A stale connection that was already replaced must not tear
    /// down its successor's channel.
    pub async fn unregister(&self, user_id: i64, conn_id: Uuid) -> bool {
        let mut channels = self.channels.write().await;
        if channels.get(&user_id).is_some_and(|c| c.conn_id == conn_id) {
            channels.remove(&user_id);
            return true;
        }
        false
    }

    /// Sends an event to the single channel bound to `user_id`, if any.
    pub async fn send_to(&self, user_id: i64, event: ServerEvent) -> bool {
        let channels = self.channels.read().await;
        match channels.get(&user_id) {
            Some(channel) => channel.tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Adds a connection to a named room.
    pub async fn join_room(&self, room: &str, conn_id: Uuid, tx: mpsc::UnboundedSender<ServerEvent>) {
        self.rooms
            .write()
            .await
            .entry(room.to_string())
            .or_default()
            .insert(conn_id, tx);
    }

    /// Removes a connection from a named room.
    pub async fn leave_room(&self, room: &str, conn_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(room) {
            members.remove(&conn_id);
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }

    /// Broadcasts an event to every member of a room, skipping the
    /// originating connection. Returns the number of receivers reached.
    pub async fn broadcast(&self, room: &str, from: Uuid, event: &ServerEvent) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room) else {
            return 0;
        };
        members
            .iter()
            .filter(|(conn_id, _)| **conn_id != from)
            .filter(|(_, tx)| tx.send(event.clone()).is_ok())
            .count()
    }
}

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The Redis connection manager.
    pub redis: ConnectionManager,
    /// The application's configuration.
    pub config: Config,
    /// Shared HTTP client for proxying and AI calls.
    pub http: reqwest::Client,
    /// The immutable routing table.
    pub routes: Arc<RouteTable>,
    /// The realtime channel registry.
    pub registry: ChannelRegistry,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis Connection Manager initialized (pooled)");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        tracing::info!("✅ HTTP client initialized ({}s timeout)", UPSTREAM_TIMEOUT_SECS);

        let routes = Arc::new(RouteTable::from_config(config));
        tracing::info!("✅ Route table built from service configuration");

        Ok(AppState {
            redis,
            config: config.clone(),
            http,
            routes,
            registry: ChannelRegistry::default(),
        })
    }
}
