//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod application_event_handler;
mod application_event_publisher;
mod directory;
mod entity_cache;
mod entity_store;
mod event_bus;
mod mailer;

#[cfg(test)]
pub use application_event_handler::MockApplicationEventHandler;
pub use application_event_handler::{ApplicationEventHandler, EventHandlerError};
#[cfg(test)]
pub use application_event_publisher::MockApplicationEventPublisher;
pub use application_event_publisher::{ApplicationEventPublisher, EventPublishError};
#[cfg(test)]
pub use directory::{MockPetDirectory, MockUserDirectory};
pub use directory::{DirectoryError, PetDirectory, PetSummary, UserContact, UserDirectory};
pub use entity_cache::{CacheLookup, EntityCache, EntityCacheError};
pub use entity_store::{EntityStore, EntityStoreError};
#[cfg(test)]
pub use event_bus::MockEventBus;
pub use event_bus::{BusMessage, EventBus, EventBusError, Subscription, SubscriptionId};
#[cfg(test)]
pub use mailer::MockMailer;
pub use mailer::{Mailer, MailerError, OutboundEmail};
