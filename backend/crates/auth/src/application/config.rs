//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Session TTL (browser session lifetime)
    pub session_ttl: Duration,
    /// Delivery-preference cookie name
    pub delivery_cookie_name: String,
    /// Provider handshake cookie name (state / PKCE / nonce)
    pub handshake_cookie_name: String,
    /// Delivery preference TTL (client must finish the redirect within this window)
    pub delivery_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Fixed token secret from the environment, overrides the persisted one
    pub token_secret_override: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "auth_session".to_string(),
            session_secret: [0u8; 32],
            session_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            delivery_cookie_name: "auth_flow".to_string(),
            handshake_cookie_name: "auth_handshake".to_string(),
            delivery_ttl: Duration::from_secs(120), // 2 minutes
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            token_secret_override: None,
        }
    }
}

impl AuthConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        let bytes = platform::crypto::random_bytes(32);
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&bytes);
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Get session TTL in milliseconds
    pub fn session_ttl_ms(&self) -> i64 {
        self.session_ttl.as_millis() as i64
    }

    /// Get delivery preference TTL in milliseconds
    pub fn delivery_ttl_ms(&self) -> i64 {
        self.delivery_ttl.as_millis() as i64
    }
}
