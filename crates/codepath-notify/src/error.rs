//! Error types for a notification run.
//!
//! [`Error`] covers the fatal stages; any of them ends the run with a
//! failure status. [`SendError`] is scoped to one recipient and never ends
//! the run.

use std::path::PathBuf;

/// Result type alias for run stages.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors: the run stops and the process exits with status 1.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required run-time parameter is missing or malformed.
    #[error("invalid parameters: {0}")]
    Parameter(String),

    /// The ownership rules could not be loaded.
    #[error("ownership config {}: {source}", path.display())]
    Config {
        /// Config file path.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: ConfigError,
    },

    /// The changed-file listing could not be fetched.
    #[error("failed to list changed files: {0}")]
    Fetch(#[from] FetchError),

    /// The mail relay access token could not be obtained.
    #[error("failed to obtain mail access token: {0}")]
    Auth(#[from] AuthError),
}

/// Problems with the ownership config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read file: {0}")]
    Read(#[from] std::io::Error),

    /// A non-blank line has no `:` separator.
    #[error("line {line}: expected `<pattern>:<recipient>`")]
    MissingSeparator {
        /// 1-based line number.
        line: usize,
    },

    /// The pattern or recipient half is empty after trimming.
    #[error("line {line}: empty {part}")]
    EmptyPart {
        /// 1-based line number.
        line: usize,
        /// "pattern" or "recipient".
        part: &'static str,
    },

    /// The pattern is not a valid regular expression.
    #[error("line {line}: invalid pattern: {source}")]
    InvalidPattern {
        /// 1-based line number.
        line: usize,
        /// Regex compile error.
        #[source]
        source: regex::Error,
    },
}

/// Failures of the pull-request files listing.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure, timeout, or unreadable body.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("GitHub API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// The response was not the expected JSON array.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The refresh-token exchange failed.
#[derive(Debug, thiserror::Error)]
#[error("{}{}", .0, rotation_hint(.0))]
pub struct AuthError(#[from] pub codepath_notify_oauth::Error);

impl AuthError {
    /// True when retrying cannot help: the refresh token itself was refused.
    #[must_use]
    pub fn needs_new_refresh_token(&self) -> bool {
        self.0.is_invalid_grant()
    }
}

fn rotation_hint(error: &codepath_notify_oauth::Error) -> &'static str {
    if error.is_invalid_grant() {
        "; the refresh token is expired or revoked, issue a new OAUTH2_REFRESH_TOKEN"
    } else {
        ""
    }
}

/// Failure to deliver one recipient's notification.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The recipient is not a usable envelope address.
    #[error("invalid recipient address: {0}")]
    Address(#[source] codepath_notify_smtp::Error),

    /// No authenticated relay session could be established.
    #[error("could not open relay session: {0}")]
    Session(#[source] codepath_notify_smtp::Error),

    /// The relay refused the message or the session failed mid-transaction.
    #[error("relay did not accept the message: {0}")]
    Delivery(#[source] codepath_notify_smtp::Error),
}
