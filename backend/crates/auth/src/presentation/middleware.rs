//! Auth Middleware
//!
//! Resolves the requesting user before route handlers run. The session
//! cookie is tried first; a Bearer token is the fallback and is always
//! accepted, independent of which interactive methods are active.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::session::SessionService;
use crate::application::verify::CredentialVerifier;
use crate::domain::entity::user::User;
use crate::domain::repository::{
    LibraryRepository, SessionRepository, SettingsRepository, UserRepository,
};
use crate::presentation::handlers::AuthAppState;

/// The resolved requester, stored in request extensions
#[derive(Clone)]
pub struct CurrentUser(pub Option<User>);

/// Middleware that resolves the requesting user, if any
pub async fn attach_user<R>(
    axum::extract::State(state): axum::extract::State<AuthAppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    let headers = req.headers();

    let mut user = None;

    if let Some(token) =
        platform::cookie::extract_cookie(headers, &state.config.session_cookie_name)
    {
        let sessions = SessionService::new(state.repo.clone(), state.config.clone());
        match sessions.resolve(&token).await {
            Ok(resolved) => user = resolved,
            Err(e) => tracing::error!(error = %e, "Session resolution failed"),
        }
    }

    if user.is_none()
        && let Some(token) = extract_bearer_token(headers)
    {
        let verifier = CredentialVerifier::new(state.repo.clone(), state.tokens.clone());
        user = verifier.verify_token(&token).await.into_user();
    }

    req.extensions_mut().insert(CurrentUser(user));

    next.run(req).await
}

/// Middleware that rejects unauthenticated requests
pub async fn require_user(req: Request<Body>, next: Next) -> Response {
    let authenticated = req
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|current| current.0.is_some());

    if !authenticated {
        return (StatusCode::UNAUTHORIZED, [("X-Auth-Required", "true")]).into_response();
    }

    next.run(req).await
}

fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}
