//! Port abstraction for announcing committed application mutations.

use async_trait::async_trait;

use crate::domain::Application;

use super::define_port_error;

define_port_error! {
    /// Errors raised while announcing an application event.
    pub enum EventPublishError {
        /// The event could not be encoded.
        Serialization { message: String } => "event serialization failed: {message}",
        /// The bus refused or failed to accept the event.
        Transport { message: String } => "event transport failed: {message}",
    }
}

/// Fire-and-forget announcements of application mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationEventPublisher: Send + Sync {
    /// Announce a newly created application.
    async fn publish_created(&self, application: &Application) -> Result<(), EventPublishError>;

    /// Announce a status change on an existing application.
    async fn publish_status_updated(
        &self,
        application: &Application,
    ) -> Result<(), EventPublishError>;
}
