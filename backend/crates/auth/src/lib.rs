//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations and identity providers
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Local username + password login
//! - Google OAuth2 and OpenID Connect redirect logins
//! - Server-side sessions with HMAC-signed cookie tokens
//! - Long-lived bearer API tokens with rotatable signing secret
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Every failed credential check answers the same way, so responses
//!   never reveal whether the account exists
//! - Redirect-flow state lives in short-lived signed cookies, not on
//!   the server

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::token::TokenService;
pub use application::verify::AuthDecision;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::postgres::PgAuthRepository as AuthStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
