//! HTTP Handlers

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use std::sync::Arc;

use platform::cookie::CookieConfig;

use crate::application::config::AuthConfig;
use crate::application::delivery::{self, DeliveryPreference, HandshakeState};
use crate::application::login_payload::{LoginPayload, LoginPayloadBuilder};
use crate::application::session::SessionService;
use crate::application::token::TokenService;
use crate::application::verify::{AuthDecision, CredentialVerifier};
use crate::domain::entity::server_settings::ServerSettings;
use crate::domain::repository::{
    LibraryRepository, SessionRepository, SettingsRepository, UserRepository,
};
use crate::domain::value_object::auth_method::AuthMethod;
use crate::error::{AuthError, AuthResult};
use crate::infra::{GoogleHandshake, OpenidHandshake};
use crate::presentation::dto::{
    EreaderDeviceView, FlowCallbackQuery, FlowInitQuery, LoginRequest, LoginResponse,
    ServerSettingsView, UserView,
};

/// Shared state for auth handlers
pub struct AuthAppState<R>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<TokenService>,
    pub google: Option<Arc<GoogleHandshake>>,
    pub openid: Option<Arc<OpenidHandshake>>,
    pub active_methods: Vec<AuthMethod>,
}

// Manual impl: a derive would demand `R: Clone`, but the repository is
// shared behind an Arc.
impl<R> Clone for AuthAppState<R>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            tokens: self.tokens.clone(),
            google: self.google.clone(),
            openid: self.openid.clone(),
            active_methods: self.active_methods.clone(),
        }
    }
}

impl<R> AuthAppState<R>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    /// Build state from persisted server settings
    ///
    /// An active federated method without provider configuration is
    /// dropped from the active set so its routes never register.
    pub fn from_settings(
        repo: Arc<R>,
        config: Arc<AuthConfig>,
        tokens: Arc<TokenService>,
        settings: &ServerSettings,
    ) -> Self {
        let mut active_methods = settings.active_auth_methods.clone();

        let google = settings
            .google
            .clone()
            .map(|s| Arc::new(GoogleHandshake::new(s)));
        if settings.is_method_active(AuthMethod::GoogleOauth20) && google.is_none() {
            tracing::warn!("google-oauth20 is active but not configured, disabling");
            active_methods.retain(|m| *m != AuthMethod::GoogleOauth20);
        }

        let openid = settings
            .openid
            .clone()
            .map(|s| Arc::new(OpenidHandshake::new(s)));
        if settings.is_method_active(AuthMethod::Openid) && openid.is_none() {
            tracing::warn!("openid is active but not configured, disabling");
            active_methods.retain(|m| *m != AuthMethod::Openid);
        }

        Self {
            repo,
            config,
            tokens,
            google,
            openid,
            active_methods,
        }
    }
}

// ============================================================================
// Local Login
// ============================================================================

/// POST /login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Response>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    let verifier = CredentialVerifier::new(state.repo.clone(), state.tokens.clone());

    let user = match verifier.verify_local(&req.username, &req.password).await {
        AuthDecision::Approve(user) => *user,
        AuthDecision::Deny => return Err(AuthError::InvalidCredentials),
    };

    let sessions = SessionService::new(state.repo.clone(), state.config.clone());
    let session_token = sessions.establish(&user).await?;

    let builder = LoginPayloadBuilder::new(state.repo.clone(), state.tokens.clone());
    let payload = builder.build(user).await?;

    let cookie = session_cookie(&state.config).build_set_cookie(&session_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(login_response(&payload)),
    )
        .into_response())
}

// ============================================================================
// Google OAuth2 Flow
// ============================================================================

/// GET /auth/google
pub async fn google_init<R>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<FlowInitQuery>,
) -> AuthResult<Response>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    let google = state.google.clone().ok_or(AuthError::MethodNotEnabled)?;
    let (auth_url, handshake) = google.authorize()?;

    start_redirect_flow(&state.config, &query, &handshake, auth_url)
}

/// GET /auth/google/callback
pub async fn google_callback<R>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<FlowCallbackQuery>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    let google = state.google.clone().ok_or(AuthError::MethodNotEnabled)?;

    let (code, returned_state) = callback_params(&query)?;
    let handshake = read_handshake_cookie(&state, &headers)?;

    let email = google
        .resolve_email(&code, &returned_state, &handshake)
        .await?;

    complete_federated_login(&state, &headers, &email).await
}

// ============================================================================
// OpenID Connect Flow
// ============================================================================

/// GET /auth/openid
pub async fn openid_init<R>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<FlowInitQuery>,
) -> AuthResult<Response>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    let openid = state.openid.clone().ok_or(AuthError::MethodNotEnabled)?;
    let (auth_url, handshake) = openid.authorize()?;

    start_redirect_flow(&state.config, &query, &handshake, auth_url)
}

/// GET /auth/openid/callback
pub async fn openid_callback<R>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<FlowCallbackQuery>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    let openid = state.openid.clone().ok_or(AuthError::MethodNotEnabled)?;

    let (code, returned_state) = callback_params(&query)?;
    let handshake = read_handshake_cookie(&state, &headers)?;

    let email = openid
        .resolve_email(&code, &returned_state, &handshake)
        .await?;

    complete_federated_login(&state, &headers, &email).await
}

// ============================================================================
// Logout
// ============================================================================

/// POST /logout
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    let token = platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name);

    if let Some(token) = token {
        let sessions = SessionService::new(state.repo.clone(), state.config.clone());
        match sessions.destroy(&token).await {
            Ok(()) => {}
            // A malformed cookie is cleared without complaint
            Err(AuthError::SessionInvalid) => {}
            // Storage failure means the session may survive: report it
            Err(e) => return Err(e),
        }
    }

    let cookie = session_cookie(&state.config).build_delete_cookie();

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({})),
    )
        .into_response())
}

// ============================================================================
// Auth Methods
// ============================================================================

/// GET /auth_methods
pub async fn auth_methods<R>(State(state): State<AuthAppState<R>>) -> Json<Vec<String>>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    Json(
        state
            .active_methods
            .iter()
            .map(|m| m.code().to_string())
            .collect(),
    )
}

// ============================================================================
// Redirect Flow Helpers
// ============================================================================

/// Seal the delivery preference and handshake state into cookies and
/// redirect to the provider
fn start_redirect_flow(
    config: &AuthConfig,
    query: &FlowInitQuery,
    handshake: &HandshakeState,
    auth_url: String,
) -> AuthResult<Response> {
    let preference =
        DeliveryPreference::from_query(query.is_rest.as_deref(), query.callback.as_deref())?;

    let delivery_cookie = flow_cookie(config, &config.delivery_cookie_name).build_set_cookie(
        &delivery::seal(&preference, &config.session_secret, config.delivery_ttl)?,
    );
    let handshake_cookie = flow_cookie(config, &config.handshake_cookie_name).build_set_cookie(
        &delivery::seal(handshake, &config.session_secret, config.delivery_ttl)?,
    );

    // AppendHeaders: a plain header array would overwrite the first
    // Set-Cookie with the second
    Ok((
        StatusCode::FOUND,
        AppendHeaders([
            (header::SET_COOKIE, delivery_cookie),
            (header::SET_COOKIE, handshake_cookie),
        ]),
        [(header::LOCATION, auth_url)],
    )
        .into_response())
}

fn callback_params(query: &FlowCallbackQuery) -> AuthResult<(String, String)> {
    let code = query
        .code
        .clone()
        .ok_or_else(|| AuthError::HandshakeFailed("Callback missing code".to_string()))?;
    let state = query
        .state
        .clone()
        .ok_or_else(|| AuthError::HandshakeFailed("Callback missing state".to_string()))?;

    Ok((code, state))
}

fn read_handshake_cookie<R>(
    state: &AuthAppState<R>,
    headers: &HeaderMap,
) -> AuthResult<HandshakeState>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    platform::cookie::extract_cookie(headers, &state.config.handshake_cookie_name)
        .and_then(|sealed| delivery::open(&sealed, &state.config.session_secret))
        .ok_or_else(|| AuthError::HandshakeFailed("Handshake cookie missing or expired".to_string()))
}

/// Resolve the federated email to a user, establish a session, and
/// honor the delivery preference sealed at flow start
async fn complete_federated_login<R>(
    state: &AuthAppState<R>,
    headers: &HeaderMap,
    email: &str,
) -> AuthResult<Response>
where
    R: UserRepository
        + SettingsRepository
        + SessionRepository
        + LibraryRepository
        + Send
        + Sync
        + 'static,
{
    let verifier = CredentialVerifier::new(state.repo.clone(), state.tokens.clone());
    let user = match verifier.verify_federated(email).await {
        AuthDecision::Approve(user) => *user,
        AuthDecision::Deny => return Err(AuthError::InvalidCredentials),
    };

    let sessions = SessionService::new(state.repo.clone(), state.config.clone());
    let session_token = sessions.establish(&user).await?;

    let builder = LoginPayloadBuilder::new(state.repo.clone(), state.tokens.clone());
    let payload = builder.build(user).await?;

    let preference: DeliveryPreference =
        platform::cookie::extract_cookie(headers, &state.config.delivery_cookie_name)
            .and_then(|sealed| delivery::open(&sealed, &state.config.session_secret))
            .ok_or(AuthError::CallbackExpired)?;

    let session_cookie = session_cookie(&state.config).build_set_cookie(&session_token);
    let clear_delivery = flow_cookie(&state.config, &state.config.delivery_cookie_name)
        .build_delete_cookie();
    let clear_handshake = flow_cookie(&state.config, &state.config.handshake_cookie_name)
        .build_delete_cookie();
    let cookies = AppendHeaders([
        (header::SET_COOKIE, session_cookie),
        (header::SET_COOKIE, clear_delivery),
        (header::SET_COOKIE, clear_handshake),
    ]);

    if preference.is_rest {
        return Ok((StatusCode::OK, cookies, Json(login_response(&payload))).into_response());
    }

    let callback = preference
        .callback
        .filter(|cb| cb.starts_with("http"))
        .ok_or(AuthError::CallbackExpired)?;

    let location = format!("{}?setToken={}", callback, payload.token);

    Ok((
        StatusCode::FOUND,
        cookies,
        [(header::LOCATION, location)],
    )
        .into_response())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn login_response(payload: &LoginPayload) -> LoginResponse {
    LoginResponse {
        user: UserView::from(&payload.user),
        user_default_library_id: payload.default_library_id.map(|id| *id.as_uuid()),
        server_settings: ServerSettingsView::from(&payload.settings),
        ereader_devices: payload
            .ereader_devices
            .iter()
            .map(EreaderDeviceView::from)
            .collect(),
        token: payload.token.clone(),
    }
}

fn session_cookie(config: &AuthConfig) -> CookieConfig {
    CookieConfig {
        name: config.session_cookie_name.clone(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: Some(config.session_ttl.as_secs() as i64),
    }
}

fn flow_cookie(config: &AuthConfig, name: &str) -> CookieConfig {
    CookieConfig {
        name: name.to_string(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: Some(config.delivery_ttl.as_secs() as i64),
    }
}
