//! Login Delivery Preference
//!
//! A redirect login spans two requests: the client states how it wants
//! the result delivered when it starts the flow, and the provider
//! callback has to honor that statement minutes later. The preference
//! is held by the client in short-lived signed cookies rather than in
//! server state, alongside the provider handshake material (state,
//! PKCE verifier, nonce).
//!
//! Cookie values are sealed envelopes: `<payload_b64>.<sig_b64>` with
//! the expiry embedded in the payload, HMAC-signed under the session
//! secret so clients cannot alter or extend them.

use chrono::Utc;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{AuthError, AuthResult};

/// How the client wants the login result delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPreference {
    /// API client: respond with the JSON payload directly
    pub is_rest: bool,
    /// Browser client: redirect here with `?setToken=`
    pub callback: Option<String>,
}

impl DeliveryPreference {
    /// Build from the flow-init query parameters
    ///
    /// `isRest=true` needs no callback; anything else must name one.
    pub fn from_query(is_rest: Option<&str>, callback: Option<&str>) -> AuthResult<Self> {
        if is_rest.is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            return Ok(Self {
                is_rest: true,
                callback: None,
            });
        }

        let callback = callback
            .filter(|cb| !cb.is_empty())
            .ok_or(AuthError::MissingCallback)?;

        Ok(Self {
            is_rest: false,
            callback: Some(callback.to_string()),
        })
    }
}

/// Provider handshake material carried across the redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeState {
    /// CSRF state the callback must echo
    pub state: String,
    /// PKCE code verifier (OAuth2)
    pub pkce_verifier: Option<String>,
    /// ID token nonce (OpenID Connect)
    pub nonce: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct Sealed<T> {
    expires_at_ms: i64,
    payload: T,
}

/// Seal a payload into a signed, expiring cookie value
pub fn seal<T: Serialize>(payload: &T, key: &[u8], ttl: Duration) -> AuthResult<String> {
    let sealed = Sealed {
        expires_at_ms: Utc::now().timestamp_millis() + ttl.as_millis() as i64,
        payload,
    };

    let json = serde_json::to_vec(&sealed)
        .map_err(|e| AuthError::Internal(format!("Envelope encoding failed: {e}")))?;

    let body = platform::crypto::to_base64_url(&json);
    let signature = platform::crypto::hmac_sign(key, body.as_bytes());

    Ok(format!(
        "{}.{}",
        body,
        platform::crypto::to_base64_url(&signature)
    ))
}

/// Open a sealed cookie value
///
/// Returns None when the envelope is malformed, the signature does not
/// verify, or the embedded expiry has passed.
pub fn open<T: DeserializeOwned>(token: &str, key: &[u8]) -> Option<T> {
    let (body, signature_b64) = token.split_once('.')?;

    let signature = platform::crypto::from_base64_url(signature_b64).ok()?;
    if !platform::crypto::hmac_verify(key, body.as_bytes(), &signature) {
        return None;
    }

    let json = platform::crypto::from_base64_url(body).ok()?;
    let sealed: Sealed<T> = serde_json::from_slice(&json).ok()?;

    if Utc::now().timestamp_millis() > sealed.expires_at_ms {
        return None;
    }

    Some(sealed.payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";
    const TTL: Duration = Duration::from_secs(120);

    #[test]
    fn test_rest_preference_needs_no_callback() {
        let pref = DeliveryPreference::from_query(Some("true"), None).unwrap();
        assert!(pref.is_rest);
        assert_eq!(pref.callback, None);
    }

    #[test]
    fn test_browser_preference_requires_callback() {
        let pref = DeliveryPreference::from_query(None, Some("https://app.example/cb")).unwrap();
        assert!(!pref.is_rest);
        assert_eq!(pref.callback.as_deref(), Some("https://app.example/cb"));

        let err = DeliveryPreference::from_query(None, None).unwrap_err();
        assert!(matches!(err, AuthError::MissingCallback));

        let err = DeliveryPreference::from_query(Some("false"), Some("")).unwrap_err();
        assert!(matches!(err, AuthError::MissingCallback));
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let pref = DeliveryPreference {
            is_rest: false,
            callback: Some("https://app.example/cb".to_string()),
        };

        let sealed = seal(&pref, KEY, TTL).unwrap();
        let opened: DeliveryPreference = open(&sealed, KEY).unwrap();
        assert_eq!(opened, pref);
    }

    #[test]
    fn test_open_rejects_tampering() {
        let state = HandshakeState {
            state: "abc123".to_string(),
            pkce_verifier: Some("verifier".to_string()),
            nonce: None,
        };

        let sealed = seal(&state, KEY, TTL).unwrap();

        // Flipped payload byte
        let mut forged = sealed.clone().into_bytes();
        forged[0] ^= 1;
        let forged = String::from_utf8(forged).unwrap();
        assert!(open::<HandshakeState>(&forged, KEY).is_none());

        // Wrong key
        assert!(open::<HandshakeState>(&sealed, b"another-key-entirely-32-bytes!!!").is_none());

        // Not an envelope at all
        assert!(open::<HandshakeState>("garbage", KEY).is_none());
    }

    #[test]
    fn test_open_rejects_expired() {
        let pref = DeliveryPreference {
            is_rest: true,
            callback: None,
        };

        let sealed = seal(&pref, KEY, Duration::ZERO).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(open::<DeliveryPreference>(&sealed, KEY).is_none());
    }
}
