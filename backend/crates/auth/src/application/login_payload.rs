//! Login Payload Assembly
//!
//! Every successful login, regardless of strategy, completes with the
//! same payload: the user, their effective default library, the server
//! settings, the e-reader devices visible to them, and their bearer
//! token.

use std::sync::Arc;

use crate::application::token::TokenService;
use crate::domain::entity::server_settings::{EreaderDevice, ServerSettings};
use crate::domain::entity::user::User;
use crate::domain::repository::{LibraryRepository, SettingsRepository, UserRepository};
use crate::domain::value_object::user_id::LibraryId;
use crate::error::AuthResult;

/// Assembled login response data
pub struct LoginPayload {
    pub user: User,
    pub default_library_id: Option<LibraryId>,
    pub settings: ServerSettings,
    pub ereader_devices: Vec<EreaderDevice>,
    /// The user's bearer token, also embedded in `user`
    pub token: String,
}

/// Login payload builder
pub struct LoginPayloadBuilder<R>
where
    R: UserRepository + SettingsRepository + LibraryRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
}

impl<R> LoginPayloadBuilder<R>
where
    R: UserRepository + SettingsRepository + LibraryRepository + Sync,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    /// Assemble the payload for an authenticated user
    ///
    /// A fresh token is issued on every login and persisted as the
    /// user's current API token.
    pub async fn build(&self, mut user: User) -> AuthResult<LoginPayload> {
        let token = self.tokens.issue(&user).await?;
        self.repo.update_token(&user.user_id, &token).await?;
        user.set_token(token.clone());

        let library_ids = self.repo.library_ids().await?;
        let default_library_id = user.resolve_default_library(&library_ids);

        let settings = self.repo.load_settings().await?;
        let ereader_devices = settings.ereader_devices_for(&user);

        Ok(LoginPayload {
            user,
            default_library_id,
            settings,
            ereader_devices,
            token,
        })
    }
}
