//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use crate::domain::entity::{server_settings::ServerSettings, session::Session, user::User};
use crate::domain::value_object::{
    email::Email,
    user_id::{LibraryId, UserId},
    username::Username,
};
use crate::error::AuthResult;
use uuid::Uuid;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by canonical username
    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<User>>;

    /// Find user by canonical email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// All users, ordered by creation time (used for bulk token reissue)
    async fn all_users(&self) -> AuthResult<Vec<User>>;

    /// Replace a user's stored API token
    async fn update_token(&self, user_id: &UserId, token: &str) -> AuthResult<()>;
}

/// Server settings repository trait (single persisted row)
#[trait_variant::make(SettingsRepository: Send)]
pub trait LocalSettingsRepository {
    /// Load settings, falling back to defaults when none are persisted
    async fn load_settings(&self) -> AuthResult<ServerSettings>;

    /// Persist settings
    async fn save_settings(&self, settings: &ServerSettings) -> AuthResult<()>;
}

/// Auth session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Create a new session
    async fn create_session(&self, session: &Session) -> AuthResult<()>;

    /// Find session by ID
    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<Session>>;

    /// Delete a session
    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()>;

    /// Clean up expired sessions
    async fn cleanup_expired_sessions(&self) -> AuthResult<u64>;
}

/// Library repository trait
///
/// The auth core only needs the identifier set, for resolving a user's
/// effective default library in the login payload.
#[trait_variant::make(LibraryRepository: Send)]
pub trait LocalLibraryRepository {
    /// All known library IDs, in configured order
    async fn library_ids(&self) -> AuthResult<Vec<LibraryId>>;
}
