//! Redis pub/sub `EventBus` implementation.
//!
//! Publishes go through the shared command pool. Each subscription owns a
//! dedicated pub/sub connection and a forwarding task that copies messages
//! into the subscription channel; unsubscribing aborts the task, which drops
//! the connection and ends the server-side subscription.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;
use bb8_redis::redis::aio::PubSub;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::DEFAULT_SUBSCRIPTION_CAPACITY;
use crate::domain::ports::{BusMessage, EventBus, EventBusError, Subscription, SubscriptionId};
use crate::outbound::redis::RedisPool;

#[derive(Default)]
struct Forwarders {
    next_id: u64,
    closed: bool,
    tasks: HashMap<SubscriptionId, JoinHandle<()>>,
}

/// Event bus over Redis pub/sub.
pub struct RedisEventBus {
    pool: RedisPool,
    capacity: usize,
    forwarders: Mutex<Forwarders>,
}

impl RedisEventBus {
    /// Create a bus over the shared pool.
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            capacity: DEFAULT_SUBSCRIPTION_CAPACITY,
            forwarders: Mutex::new(Forwarders::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Forwarders>, EventBusError> {
        self.forwarders
            .lock()
            .map_err(|_| EventBusError::connection("subscription registry lock poisoned"))
    }

    fn ensure_open(&self) -> Result<(), EventBusError> {
        if self.lock()?.closed {
            return Err(EventBusError::closed());
        }
        Ok(())
    }
}

async fn forward(pubsub: PubSub, sender: mpsc::Sender<BusMessage>) {
    let mut messages = pubsub.into_on_message();
    while let Some(message) = messages.next().await {
        let forwarded = BusMessage {
            subject: message.get_channel_name().to_owned(),
            payload: message.get_payload_bytes().to_vec(),
        };
        if sender.send(forwarded).await.is_err() {
            break;
        }
    }
    debug!("pub/sub forwarder stopped");
}

#[async_trait]
impl EventBus for RedisEventBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), EventBusError> {
        self.ensure_open()?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| EventBusError::publish(subject, err.to_string()))?;
        let receivers: i64 = conn
            .publish(subject, payload)
            .await
            .map_err(|err| EventBusError::publish(subject, err.to_string()))?;
        debug!(subject, receivers, "published event");
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, EventBusError> {
        self.ensure_open()?;
        let mut pubsub = self
            .pool
            .client()
            .get_async_pubsub()
            .await
            .map_err(|err| EventBusError::subscribe(subject, err.to_string()))?;
        pubsub
            .subscribe(subject)
            .await
            .map_err(|err| EventBusError::subscribe(subject, err.to_string()))?;

        let (sender, receiver) = mpsc::channel(self.capacity);
        let task = tokio::spawn(forward(pubsub, sender));

        let mut forwarders = self.lock()?;
        if forwarders.closed {
            task.abort();
            return Err(EventBusError::closed());
        }
        forwarders.next_id += 1;
        let id = SubscriptionId::new(forwarders.next_id);
        forwarders.tasks.insert(id, task);
        info!(subject, subscription = %id, "subscribed");
        Ok(Subscription::new(id, subject, receiver))
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), EventBusError> {
        if let Some(task) = self.lock()?.tasks.remove(&id) {
            task.abort();
            info!(subscription = %id, "unsubscribed");
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), EventBusError> {
        let mut forwarders = self.lock()?;
        forwarders.closed = true;
        for (_, task) in forwarders.tasks.drain() {
            task.abort();
        }
        Ok(())
    }
}
