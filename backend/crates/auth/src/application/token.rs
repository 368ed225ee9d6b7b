//! Token Service
//!
//! Issues and validates bearer API tokens, and rotates the signing
//! secret. Tokens are long-lived JWTs carrying only the user id and
//! username; they stay valid until the secret rotates, at which point
//! every user's stored token is reissued under the new secret.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::user::User;
use crate::domain::repository::{SettingsRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// Users reissued per batch during a secret rotation
const REISSUE_CHUNK_SIZE: usize = 100;

/// Claims embedded in a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// User UUID
    pub user_id: Uuid,
    /// Canonical username at issue time
    pub username: String,
}

/// Bearer token service
///
/// The active secret is held behind an RwLock: issue/validate take a
/// read lock, rotation holds the write lock for the whole
/// persist-and-reissue sequence so no token is ever signed with a
/// half-rotated secret.
pub struct TokenService {
    secret: RwLock<String>,
}

impl TokenService {
    pub fn new(secret: String) -> Self {
        Self {
            secret: RwLock::new(secret),
        }
    }

    /// Generate a fresh signing secret (256 random bytes, base64)
    pub fn generate_secret() -> String {
        platform::crypto::to_base64(&platform::crypto::random_bytes(256))
    }

    /// Resolve the signing secret at startup
    ///
    /// A fixed secret from the environment wins over the persisted one;
    /// when neither matches the stored tokens a full rotation runs so
    /// existing tokens are reissued rather than silently invalidated.
    pub async fn initialize<U, S>(
        token_secret_override: Option<&str>,
        user_repo: &U,
        settings_repo: &S,
    ) -> AuthResult<Self>
    where
        U: UserRepository + Sync,
        S: SettingsRepository + Sync,
    {
        let settings = settings_repo.load_settings().await?;

        match (token_secret_override, settings.token_secret.as_deref()) {
            (Some(fixed), Some(current)) if fixed == current => Ok(Self::new(current.to_string())),
            (Some(fixed), _) => {
                tracing::info!("Token secret override set, rotating to fixed secret");
                let service = Self::new(String::new());
                service
                    .rotate(fixed.to_string(), user_repo, settings_repo)
                    .await?;
                Ok(service)
            }
            (None, Some(current)) => Ok(Self::new(current.to_string())),
            (None, None) => {
                tracing::info!("No token secret persisted, generating one");
                let service = Self::new(String::new());
                service
                    .rotate(Self::generate_secret(), user_repo, settings_repo)
                    .await?;
                Ok(service)
            }
        }
    }

    /// Issue a token for a user under the active secret
    pub async fn issue(&self, user: &User) -> AuthResult<String> {
        let secret = self.secret.read().await;
        sign(&secret, user)
    }

    /// Validate a token and return its claims, or None if it does not
    /// verify under the active secret
    pub async fn validate(&self, token: &str) -> Option<AccessClaims> {
        let secret = self.secret.read().await;

        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens carry no exp claim; they expire by secret rotation
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .ok()
    }

    /// Rotate the signing secret
    ///
    /// Persists the new secret, then reissues every user's stored token
    /// under it in chunks. The write lock is held throughout, so
    /// concurrent issue/validate calls block until the rotation lands.
    pub async fn rotate<U, S>(
        &self,
        new_secret: String,
        user_repo: &U,
        settings_repo: &S,
    ) -> AuthResult<()>
    where
        U: UserRepository + Sync,
        S: SettingsRepository + Sync,
    {
        let mut guard = self.secret.write().await;

        let mut settings = settings_repo.load_settings().await?;
        settings.token_secret = Some(new_secret.clone());
        settings_repo.save_settings(&settings).await?;

        let users = user_repo.all_users().await?;
        let total = users.len();
        for chunk in users.chunks(REISSUE_CHUNK_SIZE) {
            for user in chunk {
                let token = sign(&new_secret, user)?;
                user_repo.update_token(&user.user_id, &token).await?;
            }
            tracing::debug!(chunk = chunk.len(), total, "Reissued token chunk");
        }

        *guard = new_secret;

        tracing::info!(users = total, "Token secret rotated");
        Ok(())
    }
}

/// Sign claims for a user with an explicit secret
fn sign(secret: &str, user: &User) -> AuthResult<String> {
    let claims = AccessClaims {
        user_id: *user.user_id.as_uuid(),
        username: user.username.as_str().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("Token signing failed: {e}")))
}
