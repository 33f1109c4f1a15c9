//! `OAuth2` token types.

use crate::error::Error;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// `OAuth2` access token with metadata.
///
/// `Debug` output never contains the token itself.
#[derive(Clone)]
pub struct Token {
    /// Access token string.
    pub access_token: String,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// Expiration time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Scope granted by authorization server.
    pub scope: Option<String>,
}

impl Token {
    /// Creates a token from a token endpoint response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response carries an empty access token.
    pub fn from_response(response: TokenResponse) -> Result<Self, Error> {
        if response.access_token.trim().is_empty() {
            return Err(Error::InvalidResponse("access_token is empty".into()));
        }

        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(i64::from(secs)));

        Ok(Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at,
            scope: response.scope,
        })
    }

    /// Whole seconds of validity left, if the endpoint reported a lifetime.
    /// Zero once expired.
    #[must_use]
    pub fn lifetime_secs(&self) -> Option<i64> {
        self.expires_at
            .map(|exp| (exp - Utc::now()).num_seconds().max(0))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Token response from `OAuth2` server.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expires in seconds.
    pub expires_in: Option<u32>,
    /// Scope.
    pub scope: Option<String>,
}

/// Error response from `OAuth2` server.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub error_description: String,
}

impl ErrorResponse {
    /// Converts to an Error.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::oauth_error(self.error, self.error_description)
    }
}
