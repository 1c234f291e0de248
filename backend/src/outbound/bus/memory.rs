//! In-process event bus for local runs and tests.
//!
//! Publishing never blocks: a subscriber whose buffer is full misses the
//! message, which is logged.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use super::DEFAULT_SUBSCRIPTION_CAPACITY;
use crate::domain::ports::{BusMessage, EventBus, EventBusError, Subscription, SubscriptionId};

#[derive(Default)]
struct BusState {
    next_id: u64,
    closed: bool,
    subscribers: HashMap<SubscriptionId, (String, mpsc::Sender<BusMessage>)>,
}

/// Fan-out bus backed by bounded channels.
pub struct InMemoryEventBus {
    state: Mutex<BusState>,
    capacity: usize,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIPTION_CAPACITY)
    }
}

impl InMemoryEventBus {
    /// Create a bus with the default per-subscription buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus with a custom per-subscription buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(BusState::default()),
            capacity: capacity.max(1),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().map(|state| state.subscribers.len()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BusState>, EventBusError> {
        self.state
            .lock()
            .map_err(|_| EventBusError::connection("in-memory bus lock poisoned"))
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), EventBusError> {
        let state = self.lock()?;
        if state.closed {
            return Err(EventBusError::closed());
        }
        for (id, (topic, sender)) in &state.subscribers {
            if topic != subject {
                continue;
            }
            let message = BusMessage {
                subject: subject.to_owned(),
                payload: payload.clone(),
            };
            if let Err(err) = sender.try_send(message) {
                warn!(subscription = %id, subject, error = %err, "subscriber missed message");
            }
        }
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, EventBusError> {
        let mut state = self.lock()?;
        if state.closed {
            return Err(EventBusError::closed());
        }
        state.next_id += 1;
        let id = SubscriptionId::new(state.next_id);
        let (sender, receiver) = mpsc::channel(self.capacity);
        state
            .subscribers
            .insert(id, (subject.to_owned(), sender));
        Ok(Subscription::new(id, subject, receiver))
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), EventBusError> {
        self.lock()?.subscribers.remove(&id);
        Ok(())
    }

    async fn close(&self) -> Result<(), EventBusError> {
        let mut state = self.lock()?;
        state.closed = true;
        state.subscribers.clear();
        Ok(())
    }
}
