//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{AuthMechanism, Envelope, Extension, Reply, ReplyCode};
use codepath_notify_oauth::sasl::{XOAuth2Challenge, xoauth2_response};
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, warn};

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    timeout: Duration,
    /// Set once the transport failed; no further commands are attempted.
    broken: bool,
    _state: PhantomData<State>,
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// Every later command (write plus reply) is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server is not ready.
    pub async fn from_stream(mut stream: SmtpStream, timeout: Duration) -> Result<Self> {
        let greeting = within(timeout, "greeting", read_reply(&mut stream)).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(greeting.into_error());
        }

        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        debug!(server = %hostname, "greeting received");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                ..ServerInfo::default()
            },
            timeout,
            broken: false,
            _state: PhantomData,
        })
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let reply = self
            .send_command(Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?;

        if !reply.is_success() {
            return Err(reply.into_error());
        }

        let hostname = std::mem::take(&mut self.server_info.hostname);
        self.server_info = ServerInfo::from_ehlo(hostname, &reply.message);
        Ok(self)
    }

    /// Authenticates with an `OAuth2` access token using `AUTH XOAUTH2`.
    ///
    /// When the server rejects the token it first sends a `334` challenge
    /// carrying a JSON error; the client answers with an empty line and
    /// reports the final reply together with the decoded challenge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the server does not advertise
    /// XOAUTH2, and [`Error::AuthFailed`] if the token is rejected.
    pub async fn auth_xoauth2(
        mut self,
        user: &str,
        access_token: &str,
    ) -> Result<Client<Authenticated>> {
        if !self
            .server_info
            .auth_mechanisms()
            .contains(&AuthMechanism::XOAuth2)
        {
            return Err(Error::NotSupported("AUTH XOAUTH2".into()));
        }

        let reply = self
            .send_command(Command::Auth {
                mechanism: AuthMechanism::XOAuth2,
                initial_response: Some(xoauth2_response(user, access_token)),
            })
            .await?;

        if reply.is_success() {
            debug!(user, "authenticated");
            return Ok(self.transition());
        }

        if reply.code == ReplyCode::AUTH_CONTINUE {
            let detail = reply
                .message
                .first()
                .and_then(|challenge| XOAuth2Challenge::decode(challenge))
                .map(|challenge| challenge.summary());
            let last = self
                .send_command(Command::AuthResponse(String::new()))
                .await?;
            return Err(Error::AuthFailed {
                code: last.code.as_u16(),
                message: last.message_text(),
                detail,
            });
        }

        Err(Error::AuthFailed {
            code: reply.code.as_u16(),
            message: reply.message_text(),
            detail: None,
        })
    }
}

impl Client<Authenticated> {
    /// Sends one message as a complete mail transaction.
    ///
    /// `message` should be RFC 5322 formatted. Line endings are normalized
    /// to CRLF, leading dots are stuffed and the terminating `.` line is
    /// added. If the server rejects any step, the transaction is reset so
    /// the session can be used for the next message.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection, or a transport error after which
    /// [`Client::is_open`] reports false.
    pub async fn send_mail(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        if self.broken {
            return Err(Error::ConnectionClosed);
        }

        let result = self.transaction(envelope, message).await;
        if let Err(err) = &result {
            if err.is_session_usable() && !self.broken {
                if let Err(reset_err) = self.reset().await {
                    warn!(error = %reset_err, "RSET after rejected transaction failed");
                }
            }
        }
        result
    }

    async fn transaction(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        if let Some(max) = self.server_info.max_message_size() {
            if message.len() > max {
                return Err(Error::MessageTooLarge(message.len()));
            }
        }

        let body = (!message.is_ascii()
            && self.server_info.supports(&Extension::EightBitMime))
        .then_some("8BITMIME");
        let size = self
            .server_info
            .max_message_size()
            .map(|_| message.len());

        self.expect_success(Command::MailFrom {
            from: envelope.from.clone(),
            body,
            size,
        })
        .await?;

        for to in &envelope.to {
            self.expect_success(Command::RcptTo { to: to.clone() })
                .await?;
        }

        let reply = self.send_command(Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(reply.into_error());
        }

        let payload = encode_data(message);
        let timeout = self.timeout;
        let stream = &mut self.stream;
        let result = within(timeout, "message data", async move {
            stream.write_all(&payload).await?;
            read_reply(stream).await
        })
        .await;
        let reply = self.track(result)?;

        if !reply.is_success() {
            return Err(reply.into_error());
        }
        debug!(recipients = envelope.to.len(), "message accepted");
        Ok(())
    }

    async fn reset(&mut self) -> Result<()> {
        self.expect_success(Command::Rset).await.map(|_| ())
    }
}

// Common implementation for all states
impl<S> Client<S> {
    /// Returns the server information.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Returns false once the transport has failed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.broken
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        if self.broken {
            return Ok(());
        }
        let reply = self.send_command(Command::Quit).await?;

        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(reply.into_error());
        }

        Ok(())
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            timeout: self.timeout,
            broken: self.broken,
            _state: PhantomData,
        }
    }

    async fn expect_success(&mut self, cmd: Command) -> Result<Reply> {
        let reply = self.send_command(cmd).await?;
        if reply.is_success() {
            Ok(reply)
        } else {
            Err(reply.into_error())
        }
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        let verb = cmd.verb();
        let data = cmd.serialize();
        let timeout = self.timeout;
        let stream = &mut self.stream;

        let result = within(timeout, verb, async move {
            stream.write_all(&data).await?;
            read_reply(stream).await
        })
        .await;

        let reply = self.track(result)?;
        debug!(command = verb, code = reply.code.as_u16(), "reply");
        Ok(reply)
    }

    fn track(&mut self, result: Result<Reply>) -> Result<Reply> {
        if let Err(err) = &result {
            if !err.is_session_usable() {
                self.broken = true;
            }
        }
        result
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

async fn within<T>(
    timeout: Duration,
    operation: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| Error::Timeout(operation))?
}

/// CRLF-normalizes and dot-stuffs a message, then appends the end marker.
fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 32 + 5);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    let body = body.strip_suffix(b"\r").unwrap_or(body);

    for line in body.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(b".\r\n");
    out
}
