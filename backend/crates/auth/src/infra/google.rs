//! Google OAuth2 Handshake
//!
//! Authorization Code flow with PKCE against Google's fixed endpoints.
//! No server-side handshake state: the CSRF state and PKCE verifier go
//! back to the client in a sealed cookie and return on the callback.
//! The authenticated identity is only the verified email; account
//! resolution happens in the application layer.

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;

use crate::application::delivery::HandshakeState;
use crate::domain::entity::server_settings::GoogleOauthSettings;
use crate::error::{AuthError, AuthResult};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Google userinfo API response
#[derive(Debug, Deserialize)]
struct GoogleUser {
    email: String,
    #[serde(default)]
    verified_email: bool,
}

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Google OAuth2 handshake handler
pub struct GoogleHandshake {
    settings: GoogleOauthSettings,
}

impl GoogleHandshake {
    pub fn new(settings: GoogleOauthSettings) -> Self {
        Self { settings }
    }

    fn create_client(&self) -> AuthResult<ConfiguredClient> {
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| AuthError::Internal(format!("Invalid Google auth URL: {e}")))?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| AuthError::Internal(format!("Invalid Google token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(self.settings.callback_url.clone())
            .map_err(|e| AuthError::Internal(format!("Invalid Google callback URL: {e}")))?;

        Ok(BasicClient::new(ClientId::new(self.settings.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.settings.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url))
    }

    /// Build the authorization redirect and the handshake material the
    /// client must carry to the callback
    pub fn authorize(&self) -> AuthResult<(String, HandshakeState)> {
        let client = self.create_client()?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("email".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        let handshake = HandshakeState {
            state: csrf_state.secret().clone(),
            pkce_verifier: Some(pkce_verifier.secret().clone()),
            nonce: None,
        };

        Ok((auth_url.to_string(), handshake))
    }

    /// Complete the callback: validate state, exchange the code, and
    /// resolve the verified email
    pub async fn resolve_email(
        &self,
        code: &str,
        returned_state: &str,
        handshake: &HandshakeState,
    ) -> AuthResult<String> {
        if returned_state != handshake.state {
            return Err(AuthError::HandshakeFailed("State mismatch".to_string()));
        }

        let pkce_verifier = handshake
            .pkce_verifier
            .clone()
            .ok_or_else(|| AuthError::HandshakeFailed("Missing PKCE verifier".to_string()))?;

        // Token endpoints must not be followed through redirects
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::Internal(format!("HTTP client build failed: {e}")))?;

        let client = self.create_client()?;

        let token_result = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&http_client)
            .await
            .map_err(|e| AuthError::HandshakeFailed(format!("Token exchange failed: {e}")))?;

        let access_token = token_result.access_token().secret();

        let google_user: GoogleUser = http_client
            .get(GOOGLE_USERINFO_URL)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|e| AuthError::HandshakeFailed(format!("Userinfo request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::HandshakeFailed(format!("Userinfo decode failed: {e}")))?;

        if !google_user.verified_email {
            return Err(AuthError::HandshakeFailed(
                "Google account email is not verified".to_string(),
            ));
        }

        Ok(google_user.email.to_lowercase())
    }
}
