//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::server_settings::{EreaderDevice, ServerSettings};
use crate::domain::entity::user::User;

// ============================================================================
// Login
// ============================================================================

/// Local login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Redirect Flow
// ============================================================================

/// Query parameters accepted when starting a redirect login
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowInitQuery {
    /// "true" for API clients that want the JSON payload back
    pub is_rest: Option<String>,
    /// Redirect target for browser clients
    pub callback: Option<String>,
}

/// Query parameters on the provider callback
#[derive(Debug, Clone, Deserialize)]
pub struct FlowCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

// ============================================================================
// Login Response
// ============================================================================

/// Browser-safe user projection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub user_type: String,
    pub token: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: *user.user_id.as_uuid(),
            username: user.username.as_str().to_string(),
            email: user.email.as_ref().map(|e| e.as_str().to_string()),
            user_type: user.user_type.code().to_string(),
            token: user.token.clone(),
            is_active: user.is_active,
            created_at: user.created_at.timestamp_millis(),
        }
    }
}

/// Browser-safe server settings projection
///
/// Secrets never leave the server: no token secret, no provider client
/// secrets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettingsView {
    pub active_auth_methods: Vec<String>,
}

impl From<&ServerSettings> for ServerSettingsView {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            active_auth_methods: settings
                .active_auth_methods
                .iter()
                .map(|m| m.code().to_string())
                .collect(),
        }
    }
}

/// E-reader device projection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EreaderDeviceView {
    pub name: String,
}

impl From<&EreaderDevice> for EreaderDeviceView {
    fn from(device: &EreaderDevice) -> Self {
        Self {
            name: device.name.clone(),
        }
    }
}

/// Payload returned by every successful login, regardless of strategy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserView,
    pub user_default_library_id: Option<Uuid>,
    pub server_settings: ServerSettingsView,
    pub ereader_devices: Vec<EreaderDeviceView>,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{user_type::UserType, username::Username};

    #[test]
    fn test_user_view_exposes_no_password_digest() {
        let mut user = User::new(Username::new("alice").unwrap(), UserType::User);
        user.password_digest = Some("$argon2id$secret".to_string());
        user.set_token("tok".to_string());

        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["type"], "user");
        assert_eq!(json["token"], "tok");
        assert!(json.get("passwordDigest").is_none());
        assert!(!json.to_string().contains("argon2id"));
    }

    #[test]
    fn test_settings_view_exposes_no_secrets() {
        let settings = ServerSettings {
            token_secret: Some("super-secret".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(ServerSettingsView::from(&settings)).unwrap();
        assert_eq!(json["activeAuthMethods"][0], "local");
        assert!(!json.to_string().contains("super-secret"));
    }
}
