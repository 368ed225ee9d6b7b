//! Authentication Method Value Object
//!
//! Closed set of interactive login strategies. Bearer-token
//! authentication is not listed here: it is always available and is
//! not subject to the active-method configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interactive authentication strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMethod {
    /// Username + password against local records
    Local,
    /// Google OAuth2 redirect flow
    GoogleOauth20,
    /// Generic OpenID Connect redirect flow
    Openid,
}

impl AuthMethod {
    /// Wire code, matching the persisted active-method list
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::GoogleOauth20 => "google-oauth20",
            Self::Openid => "openid",
        }
    }

    /// Create from wire code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "local" => Some(Self::Local),
            "google-oauth20" => Some(Self::GoogleOauth20),
            "openid" => Some(Self::Openid),
            _ => None,
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for method in [AuthMethod::Local, AuthMethod::GoogleOauth20, AuthMethod::Openid] {
            assert_eq!(AuthMethod::from_code(method.code()), Some(method));
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(AuthMethod::from_code("saml"), None);
        assert_eq!(AuthMethod::from_code(""), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(AuthMethod::GoogleOauth20.to_string(), "google-oauth20");
    }
}
