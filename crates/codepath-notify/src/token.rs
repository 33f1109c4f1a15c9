//! Access token for the mail relay.

use crate::config::OAuthConfig;
use crate::error::AuthError;
use codepath_notify_oauth::{OAuthClient, Provider};
use std::fmt;
use tracing::{debug, warn};

/// Short-lived bearer token presented to the relay over XOAUTH2.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The token itself; keep out of logs.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Something that can mint a relay access token.
#[allow(async_fn_in_trait)]
pub trait TokenSource {
    /// Obtains a fresh access token.
    async fn access_token(&self) -> Result<AccessToken, AuthError>;
}

/// Exchanges the long-lived refresh token at the `OAuth2` token endpoint.
#[derive(Debug)]
pub struct OAuthTokenSource {
    client: OAuthClient,
    refresh_token: String,
}

impl OAuthTokenSource {
    /// Builds the exchange client from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint URL is not http(s) or the HTTP
    /// client cannot be built.
    pub fn new(config: &OAuthConfig) -> Result<Self, AuthError> {
        let provider = Provider::google_at(config.token_url.as_str())?;
        let client = OAuthClient::new(config.client_id.clone(), provider)?
            .with_client_secret(config.client_secret.expose())
            .with_timeout(config.timeout)?;

        Ok(Self {
            client,
            refresh_token: config.refresh_token.expose().to_string(),
        })
    }
}

impl TokenSource for OAuthTokenSource {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        let token = self
            .client
            .refresh(&self.refresh_token)
            .await
            .map_err(AuthError::from)
            .inspect_err(|e| {
                if e.needs_new_refresh_token() {
                    warn!("token endpoint refused the refresh token; it must be re-issued");
                }
            })?;
        debug!(lifetime_secs = ?token.lifetime_secs(), "obtained relay access token");
        Ok(AccessToken(token.access_token))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use std::time::{Duration, Instant};
    use tokio::net::TcpListener;
    use url::Url;

    fn oauth_config(token_url: &str, timeout: Duration) -> OAuthConfig {
        OAuthConfig {
            client_id: "client".into(),
            client_secret: Secret::new("secret".to_string()),
            refresh_token: Secret::new("1//refresh".to_string()),
            token_url: Url::parse(token_url).unwrap(),
            timeout,
        }
    }

    #[tokio::test]
    async fn configured_timeout_bounds_the_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/token", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        let config = oauth_config(&url, Duration::from_millis(300));
        let source = OAuthTokenSource::new(&config).unwrap();

        let started = Instant::now();
        let err = source.access_token().await.unwrap_err();

        assert!(matches!(err.0, codepath_notify_oauth::Error::Http(ref e) if e.is_timeout()));
        assert!(!err.needs_new_refresh_token());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn non_http_token_url_is_rejected() {
        let config = oauth_config("ftp://auth.example.com/token", Duration::from_secs(1));
        assert!(OAuthTokenSource::new(&config).is_err());
    }

    #[test]
    fn debug_is_redacted() {
        let token = AccessToken::new("ya29.secret");
        assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
        assert_eq!(token.secret(), "ya29.secret");
    }
}
