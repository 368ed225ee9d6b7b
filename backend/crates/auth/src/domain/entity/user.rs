//! User Entity

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email,
    user_id::{LibraryId, UserId},
    user_type::UserType,
    username::Username,
};

/// User entity
///
/// The password digest and current API token live on the user record;
/// there is no separate credentials entity. The token is re-issued
/// whenever the server token secret rotates.
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Canonical (lowercase) login name
    pub username: Username,
    /// Email, used to resolve federated identities
    pub email: Option<Email>,
    /// Password digest (PHC string); absent for passwordless root accounts
    pub password_digest: Option<String>,
    /// Account type
    pub user_type: UserType,
    /// Inactive users can never authenticate, regardless of strategy
    pub is_active: bool,
    /// Current API bearer token issued to this user
    pub token: Option<String>,
    /// Preferred library, if any
    pub default_library_id: Option<LibraryId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user
    pub fn new(username: Username, user_type: UserType) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            username,
            email: None,
            password_digest: None,
            user_type,
            is_active: true,
            token: None,
            default_library_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A root account with no digest set authenticates without a password
    pub fn is_passwordless_root(&self) -> bool {
        self.user_type.is_root()
            && self
                .password_digest
                .as_deref()
                .is_none_or(|digest| digest.is_empty())
    }

    /// Resolve the effective default library against the known library set
    ///
    /// The stored preference wins while it still exists; otherwise the
    /// first known library is used.
    pub fn resolve_default_library(&self, library_ids: &[LibraryId]) -> Option<LibraryId> {
        match self.default_library_id {
            Some(id) if library_ids.contains(&id) => Some(id),
            _ => library_ids.first().copied(),
        }
    }

    /// The minimal identity a session stores for this user
    pub fn session_identity(&self) -> crate::domain::entity::session::SessionIdentity {
        crate::domain::entity::session::SessionIdentity { id: self.user_id }
    }

    /// Replace the stored API token
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_type: UserType, digest: Option<&str>) -> User {
        let mut u = User::new(Username::new("tester").unwrap(), user_type);
        u.password_digest = digest.map(String::from);
        u
    }

    #[test]
    fn test_passwordless_root() {
        assert!(user(UserType::Root, None).is_passwordless_root());
        assert!(user(UserType::Root, Some("")).is_passwordless_root());
        assert!(!user(UserType::Root, Some("$argon2id$x")).is_passwordless_root());
        assert!(!user(UserType::User, None).is_passwordless_root());
    }

    #[test]
    fn test_resolve_default_library_prefers_stored() {
        let libraries = vec![LibraryId::new(), LibraryId::new()];
        let mut u = user(UserType::User, None);
        u.default_library_id = Some(libraries[1]);
        assert_eq!(u.resolve_default_library(&libraries), Some(libraries[1]));
    }

    #[test]
    fn test_resolve_default_library_falls_back_to_first() {
        let libraries = vec![LibraryId::new(), LibraryId::new()];

        // No preference stored
        let u = user(UserType::User, None);
        assert_eq!(u.resolve_default_library(&libraries), Some(libraries[0]));

        // Stored preference no longer exists
        let mut u = user(UserType::User, None);
        u.default_library_id = Some(LibraryId::new());
        assert_eq!(u.resolve_default_library(&libraries), Some(libraries[0]));
    }

    #[test]
    fn test_resolve_default_library_empty_set() {
        let u = user(UserType::User, None);
        assert_eq!(u.resolve_default_library(&[]), None);
    }
}
