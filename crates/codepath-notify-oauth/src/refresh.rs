//! Refresh-token exchange against a provider's token endpoint.

use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::{ErrorResponse, Token, TokenResponse};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default bound on a single token request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `OAuth2` client credentials bound to a provider.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (optional for public clients).
    client_secret: Option<String>,
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Result<Self> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: None,
            provider,
            http_client: build_http_client(DEFAULT_TIMEOUT)?,
        })
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Bounds each token request by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = build_http_client(timeout)?;
        Ok(self)
    }

    /// Exchanges a refresh token for a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OAuth`] when the endpoint reports an `OAuth2` error,
    /// [`Error::Status`] for any other non-success response, and
    /// [`Error::Http`] / [`Error::Json`] for transport or decoding failures.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        debug!(
            provider = %self.provider.name,
            url = %self.provider.token_url,
            "refreshing access token"
        );

        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), body));
        }

        let token_response: TokenResponse = serde_json::from_str(&body)?;
        Token::from_response(token_response)
    }
}

/// Prefers the structured `OAuth2` error; falls back to the raw body.
fn error_from_body(status: u16, body: String) -> Error {
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(error) => error.into_error(),
        Err(_) => Error::Status { status, body },
    }
}

fn build_http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("codepath-notify/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
