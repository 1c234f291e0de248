//! Port abstraction for outbound email delivery.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mail transports.
    pub enum MailerError {
        /// The message could not be built from the given fields.
        Message { message: String } => "email could not be built: {message}",
        /// The transport failed to deliver the message.
        Transport { message: String } => "email transport failed: {message}",
    }
}

/// A rendered email addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
}

/// Delivery channel for rendered notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `email`.
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError>;
}
