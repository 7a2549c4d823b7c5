use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A short-lived record tracking an in-progress workout for an identity.
///
/// Stored in Redis under `workout_session:{user_id}` with a 1-hour TTL so a
/// crashed client never leaves a marker behind. Written on `workout_started`,
/// deleted on `workout_completed` and on disconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMarker {
    /// The workout being performed.
    #[serde(rename = "workoutId")]
    pub workout_id: i64,
    /// When the workout started.
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    /// The realtime connection that created the marker.
    #[serde(rename = "connectionId")]
    pub connection_id: Uuid,
}

/// TTL for session markers, in seconds.
pub const SESSION_MARKER_TTL_SECS: u64 = 3600;

/// Redis key for the session marker of an identity.
pub fn session_marker_key(user_id: i64) -> String {
    format!("workout_session:{}", user_id)
}
