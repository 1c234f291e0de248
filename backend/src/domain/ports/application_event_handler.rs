//! Port abstraction for consumers of decoded application events.

use async_trait::async_trait;

use crate::domain::{ApplicationCreated, ApplicationStatusUpdated};

use super::define_port_error;

define_port_error! {
    /// Errors raised while handling one event.
    pub enum EventHandlerError {
        /// Related records could not be fetched or were incomplete.
        Enrichment { message: String } => "event enrichment failed: {message}",
        /// The notification could not be delivered.
        Delivery { message: String } => "notification delivery failed: {message}",
    }
}

/// Reaction to decoded application events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationEventHandler: Send + Sync {
    /// Handle a created-application event.
    async fn on_created(&self, event: &ApplicationCreated) -> Result<(), EventHandlerError>;

    /// Handle a status-change event.
    async fn on_status_updated(
        &self,
        event: &ApplicationStatusUpdated,
    ) -> Result<(), EventHandlerError>;
}
