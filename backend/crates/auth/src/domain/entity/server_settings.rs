//! Server Settings Entity
//!
//! Persisted server-wide authentication settings: the token signing
//! secret, the active interactive login methods, and per-provider
//! federated identity configuration.

use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;
use crate::domain::value_object::{auth_method::AuthMethod, user_id::UserId};

/// Google OAuth2 provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleOauthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

/// OpenID Connect provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenidSettings {
    pub issuer_url: String,
    pub authorization_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

/// Registered e-reader device
///
/// `available_user_ids` limits visibility; `None` means every user.
/// Root users always see every device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EreaderDevice {
    pub name: String,
    pub available_user_ids: Option<Vec<UserId>>,
}

impl EreaderDevice {
    pub fn is_available_to(&self, user: &User) -> bool {
        if user.user_type.is_root() {
            return true;
        }
        match &self.available_user_ids {
            None => true,
            Some(ids) => ids.contains(&user.user_id),
        }
    }
}

/// Persisted server-wide auth settings (single row)
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Secret used to sign and verify bearer tokens; provisioned at startup
    pub token_secret: Option<String>,
    /// Active interactive login methods; disabled methods have no routes
    pub active_auth_methods: Vec<AuthMethod>,
    /// Google OAuth2 configuration, required when google-oauth20 is active
    pub google: Option<GoogleOauthSettings>,
    /// OpenID Connect configuration, required when openid is active
    pub openid: Option<OpenidSettings>,
    /// Registered e-reader devices
    pub ereader_devices: Vec<EreaderDevice>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            token_secret: None,
            active_auth_methods: vec![AuthMethod::Local],
            google: None,
            openid: None,
            ereader_devices: Vec::new(),
        }
    }
}

impl ServerSettings {
    pub fn is_method_active(&self, method: AuthMethod) -> bool {
        self.active_auth_methods.contains(&method)
    }

    /// E-reader devices visible to the given user
    pub fn ereader_devices_for(&self, user: &User) -> Vec<EreaderDevice> {
        self.ereader_devices
            .iter()
            .filter(|d| d.is_available_to(user))
            .cloned()
            .collect()
    }
}
