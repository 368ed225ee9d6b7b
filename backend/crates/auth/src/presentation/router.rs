//! Auth Router
//!
//! Routes register conditionally: each interactive method only gets its
//! endpoints while it is active in server settings. `/logout` and
//! `/auth_methods` are always present, and the bearer-token fallback
//! runs in middleware on every route.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::domain::entity::server_settings::ServerSettings;
use crate::domain::repository::{
    LibraryRepository, SessionRepository, SettingsRepository, UserRepository,
};
use crate::domain::value_object::auth_method::AuthMethod;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::attach_user;

/// Create the auth router with the PostgreSQL repository
pub fn auth_router(
    repo: PgAuthRepository,
    config: AuthConfig,
    tokens: Arc<TokenService>,
    settings: &ServerSettings,
) -> Router {
    auth_router_generic(repo, config, tokens, settings)
}

/// Create the auth router for any repository implementation
pub fn auth_router_generic<R>(
    repo: R,
    config: AuthConfig,
    tokens: Arc<TokenService>,
    settings: &ServerSettings,
) -> Router
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    let state = AuthAppState::from_settings(Arc::new(repo), Arc::new(config), tokens, settings);

    let mut router = Router::new()
        .route("/logout", post(handlers::logout::<R>))
        .route("/auth_methods", get(handlers::auth_methods::<R>));

    if state.active_methods.contains(&AuthMethod::Local) {
        router = router.route("/login", post(handlers::login::<R>));
    }

    if state.active_methods.contains(&AuthMethod::GoogleOauth20) {
        router = router
            .route("/auth/google", get(handlers::google_init::<R>))
            .route("/auth/google/callback", get(handlers::google_callback::<R>));
    }

    if state.active_methods.contains(&AuthMethod::Openid) {
        router = router
            .route("/auth/openid", get(handlers::openid_init::<R>))
            .route("/auth/openid/callback", get(handlers::openid_callback::<R>));
    }

    router
        .layer(middleware::from_fn_with_state(state.clone(), attach_user::<R>))
        .with_state(state)
}
