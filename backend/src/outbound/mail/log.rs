//! Mailer that records deliveries in the log instead of sending them.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{Mailer, MailerError, OutboundEmail};

/// Logs each email; used when no SMTP relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            body_bytes = email.html_body.len(),
            "email delivery skipped; no SMTP relay configured"
        );
        Ok(())
    }
}
