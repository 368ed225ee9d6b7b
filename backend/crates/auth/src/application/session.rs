//! Session Service
//!
//! Establishes and resolves cookie-backed sessions. The cookie value is
//! `<session_id>.<signature>`: a UUID plus an HMAC tag under the
//! session secret. A session only serializes the user id; the full user
//! record is reloaded on every resolve so deactivations take effect
//! immediately.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::session::Session;
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// Session service
pub struct SessionService<R>
where
    R: SessionRepository + UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> SessionService<R>
where
    R: SessionRepository + UserRepository + Sync,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Create a session for a user and return the signed cookie value
    pub async fn establish(&self, user: &User) -> AuthResult<String> {
        let ttl = Duration::from_std(self.config.session_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;

        let session = Session::new(user.session_identity(), ttl);
        self.repo.create_session(&session).await?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            "Session established"
        );

        Ok(self.sign_session_token(session.session_id))
    }

    /// Resolve a session cookie back to its user
    ///
    /// Returns None when the cookie is malformed, unsigned, expired, or
    /// the user is gone or inactive. Expired sessions are deleted on
    /// the way out.
    pub async fn resolve(&self, session_token: &str) -> AuthResult<Option<User>> {
        let Some(session_id) = self.parse_session_token(session_token) else {
            return Ok(None);
        };

        let Some(session) = self.repo.find_session(session_id).await? else {
            return Ok(None);
        };

        if session.is_expired() {
            self.repo.delete_session(session_id).await?;
            return Ok(None);
        }

        let Some(user) = self.repo.find_by_id(&session.user_id).await? else {
            return Ok(None);
        };

        if !user.is_active {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Destroy the session referenced by a cookie
    pub async fn destroy(&self, session_token: &str) -> AuthResult<()> {
        let session_id = self
            .parse_session_token(session_token)
            .ok_or(AuthError::SessionInvalid)?;

        self.repo.delete_session(session_id).await?;

        tracing::info!(session_id = %session_id, "Session destroyed");
        Ok(())
    }

    /// Generate signed session token
    fn sign_session_token(&self, session_id: Uuid) -> String {
        let session_id = session_id.to_string();
        let signature =
            platform::crypto::hmac_sign(&self.config.session_secret, session_id.as_bytes());

        format!(
            "{}.{}",
            session_id,
            platform::crypto::to_base64_url(&signature)
        )
    }

    /// Parse and verify a session token
    fn parse_session_token(&self, token: &str) -> Option<Uuid> {
        let (session_id_str, signature_b64) = token.split_once('.')?;

        let signature = platform::crypto::from_base64_url(signature_b64).ok()?;
        if !platform::crypto::hmac_verify(
            &self.config.session_secret,
            session_id_str.as_bytes(),
            &signature,
        ) {
            return None;
        }

        session_id_str.parse().ok()
    }
}
