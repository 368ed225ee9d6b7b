//! Credential Verification
//!
//! Every authentication strategy funnels into an `AuthDecision`. A
//! request is either approved with the full user record or denied;
//! unknown user, wrong password, inactive account and storage failure
//! all collapse into the same Deny so responses never reveal which
//! check failed.

use std::sync::Arc;

use crate::application::token::TokenService;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_id::UserId, username::Username};
use crate::error::AuthResult;

/// Outcome of a credential check
#[derive(Debug)]
pub enum AuthDecision {
    /// Credentials verified; carries the authenticated user
    Approve(Box<User>),
    /// Credentials rejected, for any reason
    Deny,
}

impl AuthDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, AuthDecision::Approve(_))
    }

    /// The approved user, if any
    pub fn into_user(self) -> Option<User> {
        match self {
            AuthDecision::Approve(user) => Some(*user),
            AuthDecision::Deny => None,
        }
    }
}

/// Credential verifier
pub struct CredentialVerifier<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    tokens: Arc<TokenService>,
}

impl<U> CredentialVerifier<U>
where
    U: UserRepository + Sync,
{
    pub fn new(user_repo: Arc<U>, tokens: Arc<TokenService>) -> Self {
        Self { user_repo, tokens }
    }

    /// Verify a username/password pair
    ///
    /// A root account with no password digest authenticates with an
    /// empty password and only an empty password.
    pub async fn verify_local(&self, username: &str, password: &str) -> AuthDecision {
        let Ok(username) = Username::new(username) else {
            return AuthDecision::Deny;
        };

        let Some(user) = self.lookup(self.user_repo.find_by_username(&username).await) else {
            return AuthDecision::Deny;
        };

        if !user.is_active {
            return AuthDecision::Deny;
        }

        if user.is_passwordless_root() {
            return if password.is_empty() {
                AuthDecision::Approve(Box::new(user))
            } else {
                AuthDecision::Deny
            };
        }

        let Some(digest) = user.password_digest.as_deref() else {
            return AuthDecision::Deny;
        };

        if platform::password::verify_password(password, digest) {
            AuthDecision::Approve(Box::new(user))
        } else {
            AuthDecision::Deny
        }
    }

    /// Verify a bearer token
    ///
    /// The token must verify under the active secret and name an id
    /// that still resolves to an active user. The username claim is
    /// informational; the id is authoritative.
    pub async fn verify_token(&self, token: &str) -> AuthDecision {
        let Some(claims) = self.tokens.validate(token).await else {
            return AuthDecision::Deny;
        };

        let user_id = UserId::from_uuid(claims.user_id);
        let Some(user) = self.lookup(self.user_repo.find_by_id(&user_id).await) else {
            return AuthDecision::Deny;
        };

        if !user.is_active {
            return AuthDecision::Deny;
        }

        AuthDecision::Approve(Box::new(user))
    }

    /// Resolve a federated identity by verified email
    pub async fn verify_federated(&self, email: &str) -> AuthDecision {
        let Ok(email) = Email::new(email) else {
            return AuthDecision::Deny;
        };

        let Some(user) = self.lookup(self.user_repo.find_by_email(&email).await) else {
            return AuthDecision::Deny;
        };

        if !user.is_active {
            return AuthDecision::Deny;
        }

        AuthDecision::Approve(Box::new(user))
    }

    /// Collapse storage errors into a missing user
    fn lookup(&self, result: AuthResult<Option<User>>) -> Option<User> {
        match result {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, "User lookup failed during credential check");
                None
            }
        }
    }
}
