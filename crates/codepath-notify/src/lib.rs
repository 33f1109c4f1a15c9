//! # codepath-notify
//!
//! Emails code owners when a pull request touches files they own.
//!
//! A run:
//! - loads `<regex>:<email>` ownership rules
//! - lists the files the pull request changes (GitHub REST API)
//! - matches every file against every rule
//! - if anything matched, exchanges a refresh token for a relay access token
//! - sends one HTML message per owner over SMTP with `XOAUTH2`
//!
//! Failing to deliver to one owner does not stop the others.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod changes;
pub mod config;
mod error;
pub mod matcher;
pub mod notifier;
pub mod pipeline;
pub mod rules;
pub mod token;

pub use changes::{ChangeSource, GitHubClient};
pub use config::{Cli, PullRequest, Repository, RunConfig};
pub use error::{AuthError, ConfigError, Error, FetchError, Result, SendError};
pub use matcher::{MatchSet, match_files};
pub use notifier::{MessageSender, Notification, Report, SmtpSender, notify_all};
pub use pipeline::{RunOutcome, run};
pub use rules::{OwnershipRule, load_rules, parse_rules};
pub use token::{AccessToken, OAuthTokenSource, TokenSource};
