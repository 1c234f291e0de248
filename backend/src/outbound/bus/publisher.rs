//! Application event publisher that writes JSON payloads to the bus.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{ApplicationEventPublisher, EventBus, EventPublishError};
use crate::domain::{Application, ApplicationCreated, ApplicationEvent, ApplicationStatusUpdated};

/// Serializes application events and sends them under their fixed subject.
#[derive(Clone)]
pub struct BusApplicationEventPublisher {
    bus: Arc<dyn EventBus>,
}

impl BusApplicationEventPublisher {
    /// Publish through `bus`.
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    async fn publish(&self, event: ApplicationEvent) -> Result<(), EventPublishError> {
        let payload = event
            .encode()
            .map_err(|err| EventPublishError::serialization(err.to_string()))?;
        self.bus
            .publish(event.subject(), payload)
            .await
            .map_err(|err| EventPublishError::transport(err.to_string()))?;
        debug!(
            subject = event.subject(),
            application_id = %event.application_id(),
            "application event published"
        );
        Ok(())
    }
}

#[async_trait]
impl ApplicationEventPublisher for BusApplicationEventPublisher {
    async fn publish_created(&self, application: &Application) -> Result<(), EventPublishError> {
        self.publish(ApplicationEvent::Created(ApplicationCreated::from(
            application,
        )))
        .await
    }

    async fn publish_status_updated(
        &self,
        application: &Application,
    ) -> Result<(), EventPublishError> {
        self.publish(ApplicationEvent::StatusUpdated(
            ApplicationStatusUpdated::from(application),
        ))
        .await
    }
}
