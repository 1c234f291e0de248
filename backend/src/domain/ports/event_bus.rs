//! Port abstraction for the pub/sub transport.
//!
//! Delivery is at-most-once: a published message reaches the subscribers
//! connected at that moment, and nothing is redelivered. A subscription is a
//! bounded channel of raw messages; dropping or unsubscribing it stops
//! delivery.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::define_port_error;

define_port_error! {
    /// Errors raised by event bus adapters.
    pub enum EventBusError {
        /// The bus connection could not be established.
        Connection { message: String } => "event bus connection failed: {message}",
        /// Publishing a message failed.
        Publish { subject: String, message: String } => "publish to {subject} failed: {message}",
        /// Registering a subscription failed.
        Subscribe { subject: String, message: String } => "subscribe to {subject} failed: {message}",
        /// The bus has been closed.
        Closed => "event bus is closed",
    }
}

/// One raw message received from the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Subject the message was published under.
    pub subject: String,
    /// Undecoded payload bytes.
    pub payload: Vec<u8>,
}

/// Handle identifying a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a raw adapter-assigned identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Live subscription to one subject.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    subject: String,
    messages: mpsc::Receiver<BusMessage>,
}

impl Subscription {
    /// Assemble a subscription from its adapter-side parts.
    pub fn new(
        id: SubscriptionId,
        subject: impl Into<String>,
        messages: mpsc::Receiver<BusMessage>,
    ) -> Self {
        Self {
            id,
            subject: subject.into(),
            messages,
        }
    }

    /// Identifier used to unsubscribe.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Subject this subscription listens on.
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Wait for the next message; `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<BusMessage> {
        self.messages.recv().await
    }
}

/// Pub/sub transport shared by publishers and the dispatcher.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Send `payload` to every current subscriber of `subject`.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), EventBusError>;

    /// Start receiving messages published under `subject`.
    async fn subscribe(&self, subject: &str) -> Result<Subscription, EventBusError>;

    /// Stop delivery for a subscription. Unknown ids are ignored.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), EventBusError>;

    /// Release the underlying connection; later calls fail with `Closed`.
    async fn close(&self) -> Result<(), EventBusError>;
}
