//! Auth Session Entity
//!
//! Server-side session row referenced from an HMAC-signed cookie.
//! Only the user id is reconstructed from a session; everything else
//! is reloaded from storage to avoid staleness.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::user_id::UserId;

/// Minimal serialized identity held by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity {
    pub id: UserId,
}

/// Auth session entity
#[derive(Debug, Clone)]
pub struct Session {
    /// Session ID (UUID v4)
    pub session_id: Uuid,
    /// The only user field a session carries
    pub user_id: UserId,
    /// Session expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session; TTL comes from the application config
    pub fn new(identity: SessionIdentity, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            session_id: Uuid::new_v4(),
            user_id: identity.id,
            expires_at_ms: (now + ttl).timestamp_millis(),
            created_at: now,
        }
    }

    /// Check if session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    /// The identity this session was created from
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity { id: self.user_id }
    }
}
