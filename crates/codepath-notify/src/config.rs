//! Run-time parameters.
//!
//! Everything the run needs is collected once, from flags or the CI
//! environment, into a [`RunConfig`] that is handed to each stage.

use crate::error::{Error, Result};
use clap::Parser;
use codepath_notify_oauth::provider::GOOGLE_TOKEN_URL;
use codepath_notify_smtp::Address;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default location of the ownership rules, relative to the checkout.
pub const DEFAULT_RULES_PATH: &str = ".github/workflows/scripts/codepath-notification";

/// Sender identity, also the XOAUTH2 user.
pub const DEFAULT_SENDER: &str = "info@prebid.org";

/// Command line interface; every flag falls back to an environment variable.
#[derive(Debug, Parser)]
#[command(name = "codepath-notify", version, about)]
pub struct Cli {
    /// Repository as `owner/name`.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: String,

    /// Pull request number.
    #[arg(long, env = "GITHUB_PR_NUMBER")]
    pub pr_number: u64,

    /// Token for the GitHub REST API.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// `OAuth2` client id of the mail account.
    #[arg(long, env = "OAUTH2_CLIENT_ID", hide_env_values = true)]
    pub client_id: String,

    /// `OAuth2` client secret of the mail account.
    #[arg(long, env = "OAUTH2_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Long-lived `OAuth2` refresh token of the mail account.
    #[arg(long, env = "OAUTH2_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: String,

    /// Ownership rules file (`<regex>:<email>` per line).
    #[arg(
        long = "config",
        env = "CODEPATH_NOTIFICATION_CONFIG",
        default_value = DEFAULT_RULES_PATH
    )]
    pub rules_path: PathBuf,

    /// GitHub REST API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: Url,

    /// GitHub web URL, used for the pull request link.
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = "https://github.com")]
    pub server_url: Url,

    /// `OAuth2` token endpoint.
    #[arg(long, env = "OAUTH2_TOKEN_URL", default_value = GOOGLE_TOKEN_URL)]
    pub token_url: Url,

    /// Mail relay host (implicit TLS).
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// Mail relay port.
    #[arg(long, env = "SMTP_PORT", default_value_t = 465)]
    pub smtp_port: u16,

    /// Sender address and relay login.
    #[arg(long, env = "NOTIFICATION_SENDER", default_value = DEFAULT_SENDER)]
    pub sender: String,

    /// Timeout in seconds for each GitHub or token request.
    #[arg(long, default_value_t = 30)]
    pub http_timeout: u64,

    /// Timeout in seconds for each relay command.
    #[arg(long, default_value_t = 30)]
    pub smtp_timeout: u64,
}

impl Cli {
    /// Validates the parsed flags into a [`RunConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parameter`] naming every missing or malformed value.
    pub fn into_config(self) -> Result<RunConfig> {
        let mut problems = Vec::new();

        let repository = Repository::parse(&self.repository)
            .map_err(|e| problems.push(e))
            .ok();
        if self.pr_number == 0 {
            problems.push("pull request number must be positive".to_string());
        }
        for (name, value) in [
            ("GitHub token", &self.github_token),
            ("OAuth2 client id", &self.client_id),
            ("OAuth2 client secret", &self.client_secret),
            ("OAuth2 refresh token", &self.refresh_token),
        ] {
            if value.trim().is_empty() {
                problems.push(format!("{name} is empty"));
            }
        }
        if let Err(e) = Address::new(self.sender.as_str()) {
            problems.push(format!("sender: {e}"));
        }
        if self.http_timeout == 0 || self.smtp_timeout == 0 {
            problems.push("timeouts must be at least one second".to_string());
        }

        let Some(repository) = repository.filter(|_| problems.is_empty()) else {
            return Err(Error::Parameter(problems.join("; ")));
        };

        let pull_request = PullRequest::new(repository, self.pr_number, &self.server_url);
        let http_timeout = Duration::from_secs(self.http_timeout);

        Ok(RunConfig {
            pull_request,
            rules_path: self.rules_path,
            github: GitHubConfig {
                api_url: self.api_url,
                token: Secret::new(self.github_token),
                timeout: http_timeout,
            },
            oauth: OAuthConfig {
                client_id: self.client_id,
                client_secret: Secret::new(self.client_secret),
                refresh_token: Secret::new(self.refresh_token),
                token_url: self.token_url,
                timeout: http_timeout,
            },
            relay: RelayConfig {
                host: self.smtp_host,
                port: self.smtp_port,
                implicit_tls: true,
                sender: self.sender,
                helo_name: "localhost".to_string(),
                timeout: Duration::from_secs(self.smtp_timeout),
            },
        })
    }
}

/// A credential that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a credential.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The credential itself; keep out of logs.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl Repository {
    /// Parses `owner/name`.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the value is not `owner/name`
    /// or either half contains anything but ASCII letters, digits, `.`, `_`
    /// and `-`.
    pub fn parse(value: &str) -> std::result::Result<Self, String> {
        match value.trim().split_once('/') {
            Some((owner, name)) if is_name_segment(owner) && is_name_segment(name) => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(format!("repository {value:?} is not owner/name")),
        }
    }
}

// The name ends up in the Subject header, so CR/LF must never get through.
fn is_name_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The pull request being inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Repository the pull request belongs to.
    pub repository: Repository,
    /// Pull request number.
    pub number: u64,
    /// Web link to the pull request.
    pub html_url: String,
}

impl PullRequest {
    /// Builds the pull request and its web link under `server_url`.
    #[must_use]
    pub fn new(repository: Repository, number: u64, server_url: &Url) -> Self {
        let html_url = format!(
            "{}/{repository}/pull/{number}",
            server_url.as_str().trim_end_matches('/')
        );
        Self {
            repository,
            number,
            html_url,
        }
    }
}

/// Settings for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base URL.
    pub api_url: Url,
    /// Bearer token.
    pub token: Secret,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Credentials for the refresh-token exchange.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Client id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: Secret,
    /// Refresh token.
    pub refresh_token: Secret,
    /// Token endpoint.
    pub token_url: Url,
    /// Request timeout.
    pub timeout: Duration,
}

/// Mail relay connection parameters.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Relay host.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// TLS from the first byte (port 465); plain TCP otherwise.
    pub implicit_tls: bool,
    /// Sender address and XOAUTH2 user.
    pub sender: String,
    /// Name announced in EHLO.
    pub helo_name: String,
    /// Per-command timeout.
    pub timeout: Duration,
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Pull request under inspection.
    pub pull_request: PullRequest,
    /// Ownership rules file.
    pub rules_path: PathBuf,
    /// GitHub API settings.
    pub github: GitHubConfig,
    /// Token exchange settings.
    pub oauth: OAuthConfig,
    /// Mail relay settings.
    pub relay: RelayConfig,
}
