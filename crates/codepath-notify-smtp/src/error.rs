//! Error types for SMTP operations.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Server returned error response.
    #[error("SMTP error {code}: {message}")]
    SmtpError {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Authentication was rejected.
    #[error("authentication failed ({code}): {message}{}", bracketed(detail.as_deref()))]
    AuthFailed {
        /// Final reply code (usually 535).
        code: u16,
        /// Final reply text.
        message: String,
        /// Decoded XOAUTH2 challenge, if the server sent one.
        detail: Option<String>,
    },

    /// Protocol error (unexpected or malformed response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server closed the connection.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// An operation did not finish within the configured timeout.
    #[error("timed out during {0}")]
    Timeout(&'static str),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message too large.
    #[error("Message exceeds size limit: {0} bytes")]
    MessageTooLarge(usize),

    /// Feature not supported by server.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the server answered and the session can carry
    /// another transaction; false when the transport itself failed.
    #[must_use]
    pub const fn is_session_usable(&self) -> bool {
        match self {
            // 421: the server is closing the channel
            Self::SmtpError { code, .. } => *code != 421,
            Self::InvalidAddress(_) | Self::MessageTooLarge(_) => true,
            _ => false,
        }
    }
}

fn bracketed(detail: Option<&str>) -> String {
    detail.map(|d| format!(" [{d}]")).unwrap_or_default()
}
