//! Composing and delivering owner notifications.

use crate::config::{PullRequest, RelayConfig};
use crate::error::SendError;
use crate::token::AccessToken;
use chrono::Utc;
use codepath_notify_smtp::connection::{connect, connect_tls};
use codepath_notify_smtp::{Address, Authenticated, Client, Envelope};
use std::fmt::Write;
use tracing::{debug, error, info, warn};

/// One message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

impl Notification {
    /// Builds the message telling `recipient` which of their files `pull_request` changes.
    #[must_use]
    pub fn compose(
        pull_request: &PullRequest,
        sender: &str,
        recipient: &str,
        files: &[String],
    ) -> Self {
        let repository = pull_request.repository.to_string();

        let mut html = String::new();
        let _ = writeln!(
            html,
            "<p>The following files, owned by you, have been changed in \
             <a href=\"{url}\">{repo} pull request #{number}</a>:</p>",
            url = escape_html(&pull_request.html_url),
            repo = escape_html(&repository),
            number = pull_request.number,
        );
        html.push_str("<ul>\n");
        for file in files {
            let _ = writeln!(html, "<li>{}</li>", escape_html(file));
        }
        html.push_str("</ul>\n");

        Self {
            from: sender.to_string(),
            to: recipient.to_string(),
            subject: format!("Files owned by you have been changed in {repository}"),
            html,
        }
    }

    /// Renders the message with headers, CRLF line endings throughout.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        let mut message = String::new();

        let _ = write!(message, "From: {}\r\n", self.from);
        let _ = write!(message, "To: {}\r\n", self.to);
        let _ = write!(message, "Subject: {}\r\n", self.subject);
        let _ = write!(message, "Date: {}\r\n", Utc::now().to_rfc2822());
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/html; charset=utf-8\r\n");
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");
        message.push_str("\r\n");

        for line in self.html.lines() {
            message.push_str(line);
            message.push_str("\r\n");
        }
        message
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Something that can deliver notifications, one at a time.
#[allow(async_fn_in_trait)]
pub trait MessageSender {
    /// Delivers one notification.
    async fn send(&mut self, notification: &Notification) -> Result<(), SendError>;

    /// Ends the session, if any.
    async fn close(self)
    where
        Self: Sized,
    {
    }
}

/// Delivers over an XOAUTH2-authenticated SMTP session.
///
/// The session is opened on the first send and reused. After a transport
/// failure it is dropped and the next send opens a new one.
#[derive(Debug)]
pub struct SmtpSender {
    config: RelayConfig,
    token: AccessToken,
    client: Option<Client<Authenticated>>,
}

impl SmtpSender {
    /// Creates a sender; nothing is connected until the first send.
    #[must_use]
    pub const fn new(config: RelayConfig, token: AccessToken) -> Self {
        Self {
            config,
            token,
            client: None,
        }
    }

    async fn open(&self) -> codepath_notify_smtp::Result<Client<Authenticated>> {
        let RelayConfig {
            host,
            port,
            timeout,
            ..
        } = &self.config;

        let stream = if self.config.implicit_tls {
            connect_tls(host, *port, *timeout).await?
        } else {
            connect(host, *port, *timeout).await?
        };

        let client = Client::from_stream(stream, *timeout)
            .await?
            .ehlo(&self.config.helo_name)
            .await?
            .auth_xoauth2(&self.config.sender, self.token.secret())
            .await?;

        info!(host = %host, port, "relay session established");
        Ok(client)
    }

    async fn session(&mut self) -> Result<&mut Client<Authenticated>, SendError> {
        let client = match self.client.take() {
            Some(client) if client.is_open() => client,
            stale => {
                if stale.is_some() {
                    debug!("previous relay session failed, reconnecting");
                }
                self.open().await.map_err(SendError::Session)?
            }
        };
        Ok(self.client.insert(client))
    }
}

impl MessageSender for SmtpSender {
    async fn send(&mut self, notification: &Notification) -> Result<(), SendError> {
        let from = Address::new(notification.from.as_str()).map_err(SendError::Address)?;
        let to = Address::new(notification.to.as_str()).map_err(SendError::Address)?;
        let envelope = Envelope::new(from, to);
        let message = notification.to_rfc5322();

        let client = self.session().await?;
        client
            .send_mail(&envelope, message.as_bytes())
            .await
            .map_err(SendError::Delivery)
    }

    async fn close(mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.quit().await {
                warn!(error = %e, "QUIT failed");
            }
        }
    }
}

/// Recipients by delivery result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Recipients whose message the relay accepted.
    pub sent: Vec<String>,
    /// Recipients whose message could not be delivered.
    pub failed: Vec<String>,
}

/// Sends every notification in order; a failure is logged and the next
/// recipient is still attempted.
pub async fn notify_all<S: MessageSender>(
    sender: &mut S,
    notifications: &[Notification],
) -> Report {
    let mut report = Report::default();

    for notification in notifications {
        match sender.send(notification).await {
            Ok(()) => {
                info!(recipient = %notification.to, "notification sent");
                report.sent.push(notification.to.clone());
            }
            Err(e) => {
                error!(recipient = %notification.to, error = %e, "notification failed");
                report.failed.push(notification.to.clone());
            }
        }
    }

    report
}
