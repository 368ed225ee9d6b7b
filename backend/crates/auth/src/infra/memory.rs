//! In-Memory Repository for Tests

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::domain::entity::server_settings::ServerSettings;
use crate::domain::entity::session::Session;
use crate::domain::entity::user::User;
use crate::domain::repository::{
    LibraryRepository, SessionRepository, SettingsRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    user_id::{LibraryId, UserId},
    username::Username,
};
use crate::error::AuthResult;

/// In-memory auth repository backing unit tests
#[derive(Default)]
pub struct MemoryAuthRepository {
    users: Mutex<HashMap<UserId, User>>,
    sessions: Mutex<HashMap<Uuid, Session>>,
    settings: Mutex<ServerSettings>,
    libraries: Mutex<Vec<LibraryId>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.user_id, user);
    }

    pub fn remove_user(&self, user_id: &UserId) {
        self.users.lock().unwrap().remove(user_id);
    }

    pub fn set_settings(&self, settings: ServerSettings) {
        *self.settings.lock().unwrap() = settings;
    }

    pub fn set_libraries(&self, ids: Vec<LibraryId>) {
        *self.libraries.lock().unwrap() = ids;
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

impl UserRepository for MemoryAuthRepository {
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == *username)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.as_ref() == Some(email))
            .cloned())
    }

    async fn all_users(&self) -> AuthResult<Vec<User>> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update_token(&self, user_id: &UserId, token: &str) -> AuthResult<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
            user.set_token(token.to_string());
        }
        Ok(())
    }
}

impl SettingsRepository for MemoryAuthRepository {
    async fn load_settings(&self) -> AuthResult<ServerSettings> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn save_settings(&self, settings: &ServerSettings) -> AuthResult<()> {
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}

impl SessionRepository for MemoryAuthRepository {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<Session>> {
        Ok(self.sessions.lock().unwrap().get(&session_id).cloned())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        self.sessions.lock().unwrap().remove(&session_id);
        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

impl LibraryRepository for MemoryAuthRepository {
    async fn library_ids(&self) -> AuthResult<Vec<LibraryId>> {
        Ok(self.libraries.lock().unwrap().clone())
    }
}
