//! Session-related types for admin authentication.
//!
//! Login happens elsewhere (a redirect-based flow on the auth service).
//! What comes back is an access token plus a user profile, which the
//! admin UI posts to `/auth/token` to be kept in the session.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Session-stored auth blob.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredAuth {
    /// Bearer token issued by the auth service.
    pub token: String,
    /// Profile returned alongside the token, kept as-is.
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

impl std::fmt::Debug for StoredAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredAuth")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Bearer token forwarded to the catalog backend.
#[derive(Debug, Clone)]
pub struct AdminToken(SecretString);

impl AdminToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the stored auth blob.
    pub const AUTH: &str = "auth";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let auth = StoredAuth {
            token: "tok_live_abc123".to_string(),
            user: Some(serde_json::json!({ "email": "ops@minimoda.example" })),
        };
        let debug = format!("{auth:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("tok_live_abc123"));

        let token = AdminToken::new("tok_live_abc123");
        assert!(!format!("{token:?}").contains("tok_live_abc123"));
        assert_eq!(token.expose(), "tok_live_abc123");
    }
}
