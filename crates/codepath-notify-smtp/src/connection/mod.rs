//! SMTP connection management with type-state pattern.

mod client;
mod stream;

pub use client::{Authenticated, Client, Connected};
pub use stream::{SmtpStream, connect, connect_tls};

use crate::types::{AuthMechanism, Extension};
use std::collections::HashSet;

/// Server capabilities from the greeting and EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from greeting.
    pub hostname: String,
    /// Supported extensions.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Returns the maximum message size, if advertised with a value.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }

    /// Returns supported authentication mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn from_ehlo(hostname: String, lines: &[String]) -> Self {
        Self {
            hostname,
            // first line is the server's greeting to us, not an extension
            extensions: lines.iter().skip(1).map(|l| Extension::parse(l)).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn info(lines: &[&str]) -> ServerInfo {
        let lines: Vec<String> = lines.iter().map(ToString::to_string).collect();
        ServerInfo::from_ehlo("smtp.gmail.com".into(), &lines)
    }

    #[test]
    fn collects_extensions_after_greeting_line() {
        let info = info(&[
            "smtp.gmail.com at your service",
            "SIZE 35882577",
            "8BITMIME",
            "AUTH LOGIN PLAIN XOAUTH2",
        ]);
        assert_eq!(info.max_message_size(), Some(35_882_577));
        assert!(info.supports(&Extension::EightBitMime));
        assert!(info.auth_mechanisms().contains(&AuthMechanism::XOAuth2));
        assert!(!info.supports(&Extension::Unknown("smtp.gmail.com at your service".into())));
    }

    #[test]
    fn no_auth_advertised() {
        let info = info(&["relay.local", "PIPELINING"]);
        assert!(info.auth_mechanisms().is_empty());
        assert_eq!(info.max_message_size(), None);
    }
}
