//! # codepath-notify-oauth
//!
//! `OAuth2` support for sending mail through a relay that only accepts
//! bearer tokens (Gmail, Outlook).
//!
//! ## Features
//!
//! - **Refresh-token exchange**: trade a long-lived refresh token for a
//!   short-lived access token
//! - **Provider configurations**: Google preset, or any token endpoint
//! - **SASL encoding**: XOAUTH2 initial response and server challenge decoding
//!
//! ## Quick Start
//!
//! ```ignore
//! use codepath_notify_oauth::{OAuthClient, Provider};
//! use codepath_notify_oauth::sasl::xoauth2_response;
//!
//! #[tokio::main]
//! async fn main() -> codepath_notify_oauth::Result<()> {
//!     let client = OAuthClient::new("client_id", Provider::google()?)?
//!         .with_client_secret("client_secret");
//!
//!     let token = client.refresh("refresh_token").await?;
//!     let initial_response = xoauth2_response("info@example.org", &token.access_token);
//!     // Send: AUTH XOAUTH2 {initial_response}
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod provider;
mod refresh;
pub mod sasl;
pub mod token;

pub use error::{Error, Result};
pub use provider::Provider;
pub use refresh::OAuthClient;
pub use token::Token;
