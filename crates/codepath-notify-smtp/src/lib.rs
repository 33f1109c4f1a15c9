//! # codepath-notify-smtp
//!
//! A small SMTP submission client (RFC 5321) for sending notification mail
//! through an `OAuth2`-protected relay such as Gmail.
//!
//! ## Features
//!
//! - **Type-state session**: a message can only be sent once the session is
//!   authenticated
//! - **Implicit TLS** on port 465 (plain TCP for local relays and tests)
//! - **`AUTH XOAUTH2`** with decoding of the server's error challenge
//! - **Reusable session**: a rejected transaction is reset so the next
//!   recipient can still be attempted
//! - **Per-command timeouts**
//!
//! ## Quick Start
//!
//! ```ignore
//! use codepath_notify_smtp::{Address, Client, Envelope};
//! use codepath_notify_smtp::connection::connect_tls;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> codepath_notify_smtp::Result<()> {
//!     let timeout = Duration::from_secs(30);
//!     let stream = connect_tls("smtp.gmail.com", 465, timeout).await?;
//!     let client = Client::from_stream(stream, timeout).await?;
//!     let client = client.ehlo("localhost").await?;
//!     let mut client = client.auth_xoauth2("info@example.org", "ya29...").await?;
//!
//!     let envelope = Envelope::new(
//!         Address::new("info@example.org")?,
//!         Address::new("owner@example.com")?,
//!     );
//!     client.send_mail(&envelope, b"Subject: hi\r\n\r\nbody\r\n").await?;
//!     client.quit().await
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! ┌──────────────┐                       ┌───────────────┐
//! │  Connected   │ ── auth_xoauth2() ──→ │ Authenticated │ ⟲ send_mail()
//! └──────────────┘                       └───────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{Authenticated, Client, Connected, ServerInfo, SmtpStream};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Envelope, Extension, Reply, ReplyCode};
