//! `OAuth2` provider configurations.

use crate::error::{Error, Result};
use url::Url;

/// Google's token endpoint, used for the refresh-token exchange.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// `OAuth2` provider configuration.
///
/// Only the token endpoint matters for a refresh-token exchange; scopes were
/// fixed when the refresh token was minted.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Token endpoint URL.
    pub token_url: Url,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the token URL is invalid or not HTTP(S).
    pub fn new(name: impl Into<String>, token_url: impl AsRef<str>) -> Result<Self> {
        let provider = Self {
            name: name.into(),
            token_url: Url::parse(token_url.as_ref())?,
        };
        provider.validate()?;
        Ok(provider)
    }

    /// Google `OAuth2` provider configuration.
    ///
    /// The refresh token must have been minted for `https://mail.google.com/`
    /// to be usable with SMTP XOAUTH2.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Self::new("Google", GOOGLE_TOKEN_URL)
    }

    /// Google's name, but a different token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn google_at(token_url: impl AsRef<str>) -> Result<Self> {
        let mut provider = Self::google()?;
        provider.token_url = Url::parse(token_url.as_ref())?;
        provider.validate()?;
        Ok(provider)
    }

    /// Validates that the token endpoint is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        match self.token_url.scheme() {
            "https" | "http" => Ok(()),
            other => Err(Error::InvalidConfig(format!(
                "token_url must be http(s), got {other}"
            ))),
        }
    }
}
