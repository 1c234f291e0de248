//! SMTP mailer built on `lettre`.
//!
//! Port 465 uses implicit TLS; every other port negotiates STARTTLS.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::domain::ports::{Mailer, MailerError, OutboundEmail};

const IMPLICIT_TLS_PORT: u16 = 465;

/// Relay connection settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// Relay host name.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Optional login user.
    pub username: Option<String>,
    /// Optional login password.
    pub password: Option<String>,
    /// Envelope and header sender.
    pub sender: String,
    /// Per-command timeout.
    pub timeout: Duration,
}

/// Async SMTP transport with a fixed sender.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Build a transport for the configured relay.
    ///
    /// # Errors
    ///
    /// Returns `MailerError::Message` when the sender address is invalid and
    /// `MailerError::Transport` when the relay cannot be configured.
    pub fn new(settings: SmtpSettings) -> Result<Self, MailerError> {
        let sender: Mailbox = settings
            .sender
            .parse()
            .map_err(|err| MailerError::message(format!("invalid sender address: {err}")))?;

        let builder = if settings.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|err| MailerError::transport(err.to_string()))?;

        let mut builder = builder
            .port(settings.port)
            .timeout(Some(settings.timeout));
        if let (Some(username), Some(password)) = (settings.username, settings.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }

    fn build_message(&self, email: &OutboundEmail) -> Result<Message, MailerError> {
        let recipient: Mailbox = email
            .to
            .parse()
            .map_err(|err| MailerError::message(format!("invalid recipient address: {err}")))?;
        Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())
            .map_err(|err| MailerError::message(err.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        let message = self.build_message(email)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|err| MailerError::transport(err.to_string()))?;
        info!(to = %email.to, code = %response.code(), "email delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(sender: &str) -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_owned(),
            port: 587,
            username: None,
            password: None,
            sender: sender.to_owned(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn rejects_invalid_sender() {
        let result = SmtpMailer::new(settings("not an address"));
        assert!(matches!(result, Err(MailerError::Message { .. })));
    }

    #[test]
    fn rejects_invalid_recipient() {
        let mailer = SmtpMailer::new(settings("noreply@petstore.example")).expect("builds");
        let email = OutboundEmail {
            to: "nobody".to_owned(),
            subject: "Hello".to_owned(),
            html_body: "<p>Hi</p>".to_owned(),
        };
        assert!(matches!(
            mailer.build_message(&email),
            Err(MailerError::Message { .. })
        ));
    }
}
