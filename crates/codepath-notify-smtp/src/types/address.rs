//! Envelope addresses.

use crate::error::{Error, Result};
use std::fmt;

/// Email address for the SMTP envelope (`MAIL FROM` / `RCPT TO`).
///
/// Validation is deliberately shallow: the relay is the authority on
/// deliverability. It only guarantees the value cannot break out of the
/// command line it is written into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty, lacks a single `@` with
    /// non-empty local and domain parts, or contains whitespace, control
    /// characters or angle brackets.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("address cannot be empty".into()));
        }

        if addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "{addr:?} contains whitespace, control characters or angle brackets"
            )));
        }

        match addr.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(())
            }
            _ => Err(Error::InvalidAddress(format!("{addr:?} must be local@domain"))),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sender and recipients of one mail transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Reverse path.
    pub from: Address,
    /// Forward paths; never empty.
    pub to: Vec<Address>,
}

impl Envelope {
    /// Creates an envelope with a single recipient.
    #[must_use]
    pub fn new(from: Address, to: Address) -> Self {
        Self { from, to: vec![to] }
    }

    /// Adds another recipient.
    #[must_use]
    pub fn and_to(mut self, to: Address) -> Self {
        self.to.push(to);
        self
    }
}
