//! SASL encoding for `OAuth2` bearer authentication.
//!
//! Gmail's SMTP relay accepts `AUTH XOAUTH2` with an initial response. On
//! failure it answers `334 <base64 json>` and expects an empty line before
//! sending the final `535`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

/// Generates XOAUTH2 initial response.
///
/// Format: `user=<user>\x01auth=Bearer <token>\x01\x01` (base64 encoded)
#[must_use]
pub fn xoauth2_response(user: &str, token: &str) -> String {
    let auth_string = format!("user={user}\x01auth=Bearer {token}\x01\x01");
    STANDARD.encode(auth_string.as_bytes())
}

/// Error document a server sends in an XOAUTH2 `334` challenge.
#[derive(Debug, Clone, Deserialize)]
pub struct XOAuth2Challenge {
    /// HTTP-style status (e.g. "400", "401").
    pub status: String,
    /// Authentication schemes supported.
    #[serde(default)]
    pub schemes: String,
    /// Scope the token would need.
    #[serde(default)]
    pub scope: Option<String>,
}

impl XOAuth2Challenge {
    /// Decodes the base64 text following a `334` reply code.
    ///
    /// Returns `None` if the challenge is not base64 JSON.
    #[must_use]
    pub fn decode(challenge: &str) -> Option<Self> {
        let bytes = STANDARD.decode(challenge.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// One-line summary for diagnostics.
    #[must_use]
    pub fn summary(&self) -> String {
        match &self.scope {
            Some(scope) => format!("status {} (scope {scope})", self.status),
            None => format!("status {}", self.status),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn xoauth2_exact_format() {
        let response = xoauth2_response("info@prebid.org", "ya29.abc");
        let decoded = String::from_utf8(STANDARD.decode(&response).unwrap()).unwrap();
        assert_eq!(decoded, "user=info@prebid.org\x01auth=Bearer ya29.abc\x01\x01");
    }

    #[test]
    fn xoauth2_is_base64_only() {
        let response = xoauth2_response("info@prebid.org", "token");
        assert!(!response.contains('@'));
        assert!(!response.contains(' '));
    }

    #[test]
    fn decodes_gmail_challenge() {
        let raw = r#"{"status":"400","schemes":"Bearer","scope":"https://mail.google.com/"}"#;
        let challenge = XOAuth2Challenge::decode(&STANDARD.encode(raw)).unwrap();
        assert_eq!(challenge.status, "400");
        assert_eq!(challenge.schemes, "Bearer");
        assert_eq!(
            challenge.summary(),
            "status 400 (scope https://mail.google.com/)"
        );
    }

    #[test]
    fn garbage_challenge_is_none() {
        assert!(XOAuth2Challenge::decode("not base64!").is_none());
        assert!(XOAuth2Challenge::decode(&STANDARD.encode("plain text")).is_none());
    }
}
