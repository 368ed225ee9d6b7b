//! OpenID Connect Handshake
//!
//! Authorization Code flow against an operator-configured provider.
//! Endpoints come from server settings rather than discovery, matching
//! how the provider is administered. Identity resolution goes through
//! the userinfo endpoint, so only providers that expose one are
//! supported.

use openidconnect::core::{
    CoreAuthenticationFlow, CoreClient, CoreJsonWebKeySet, CoreUserInfoClaims,
};
use openidconnect::reqwest::async_http_client;
use openidconnect::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce,
    OAuth2TokenResponse, RedirectUrl, Scope, TokenUrl, UserInfoUrl,
};

use crate::application::delivery::HandshakeState;
use crate::domain::entity::server_settings::OpenidSettings;
use crate::error::{AuthError, AuthResult};

/// OpenID Connect handshake handler
pub struct OpenidHandshake {
    settings: OpenidSettings,
}

impl OpenidHandshake {
    pub fn new(settings: OpenidSettings) -> Self {
        Self { settings }
    }

    fn create_client(&self) -> AuthResult<CoreClient> {
        let issuer_url = IssuerUrl::new(self.settings.issuer_url.clone())
            .map_err(|e| AuthError::Internal(format!("Invalid OIDC issuer URL: {e}")))?;
        let auth_url = AuthUrl::new(self.settings.authorization_url.clone())
            .map_err(|e| AuthError::Internal(format!("Invalid OIDC authorization URL: {e}")))?;
        let token_url = TokenUrl::new(self.settings.token_url.clone())
            .map_err(|e| AuthError::Internal(format!("Invalid OIDC token URL: {e}")))?;
        let userinfo_url = UserInfoUrl::new(self.settings.userinfo_url.clone())
            .map_err(|e| AuthError::Internal(format!("Invalid OIDC userinfo URL: {e}")))?;
        let redirect_url = RedirectUrl::new(self.settings.callback_url.clone())
            .map_err(|e| AuthError::Internal(format!("Invalid OIDC callback URL: {e}")))?;

        Ok(CoreClient::new(
            ClientId::new(self.settings.client_id.clone()),
            Some(ClientSecret::new(self.settings.client_secret.clone())),
            issuer_url,
            auth_url,
            Some(token_url),
            Some(userinfo_url),
            CoreJsonWebKeySet::default(),
        )
        .set_redirect_uri(redirect_url))
    }

    /// Build the authorization redirect and the handshake material the
    /// client must carry to the callback
    pub fn authorize(&self) -> AuthResult<(String, HandshakeState)> {
        let client = self.create_client()?;

        let (auth_url, csrf_state, nonce) = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();

        let handshake = HandshakeState {
            state: csrf_state.secret().clone(),
            pkce_verifier: None,
            nonce: Some(nonce.secret().clone()),
        };

        Ok((auth_url.to_string(), handshake))
    }

    /// Complete the callback: validate state, exchange the code, and
    /// resolve the email from the userinfo endpoint
    pub async fn resolve_email(
        &self,
        code: &str,
        returned_state: &str,
        handshake: &HandshakeState,
    ) -> AuthResult<String> {
        if returned_state != handshake.state {
            return Err(AuthError::HandshakeFailed("State mismatch".to_string()));
        }

        let client = self.create_client()?;

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::HandshakeFailed(format!("Token exchange failed: {e}")))?;

        let claims: CoreUserInfoClaims = client
            .user_info(token_response.access_token().clone(), None)
            .map_err(|e| AuthError::HandshakeFailed(format!("Userinfo not configured: {e}")))?
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::HandshakeFailed(format!("Userinfo request failed: {e}")))?;

        let email = claims
            .email()
            .ok_or_else(|| AuthError::HandshakeFailed("Provider returned no email".to_string()))?;

        if claims.email_verified() == Some(false) {
            return Err(AuthError::HandshakeFailed(
                "Provider email is not verified".to_string(),
            ));
        }

        Ok(email.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> OpenidSettings {
        OpenidSettings {
            issuer_url: "https://idp.example".to_string(),
            authorization_url: "https://idp.example/authorize".to_string(),
            token_url: "https://idp.example/token".to_string(),
            userinfo_url: "https://idp.example/userinfo".to_string(),
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            callback_url: "https://server.example/auth/openid/callback".to_string(),
        }
    }

    #[test]
    fn test_authorize_url_carries_state_and_nonce() {
        let handshake = OpenidHandshake::new(settings());
        let (url, state) = handshake.authorize().unwrap();

        assert!(url.starts_with("https://idp.example/authorize"));
        assert!(url.contains("scope=openid+email+profile"));
        assert!(url.contains(&format!("state={}", state.state)));
        assert!(state.nonce.is_some());
        assert_eq!(state.pkce_verifier, None);
    }

    #[tokio::test]
    async fn test_callback_rejects_state_mismatch() {
        let handshake = OpenidHandshake::new(settings());
        let (_, state) = handshake.authorize().unwrap();

        let err = handshake
            .resolve_email("code", "not-the-state", &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::HandshakeFailed(_)));
    }
}
