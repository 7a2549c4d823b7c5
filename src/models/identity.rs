use serde::{Deserialize, Serialize};

/// The claims carried by a bearer token.
///
/// Claim names match what the user service signs at login/registration
/// (HS256, 24-hour expiry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The stable subject id of the user.
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// The user's email address.
    pub email: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// The verified identity attached to a request or realtime connection.
#[derive(Debug, Clone)]
pub struct Identity {
    /// The stable subject id of the user.
    pub user_id: i64,
    /// The user's email address.
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}
