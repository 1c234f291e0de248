//! Event dispatcher: bus subscriptions feeding per-message handler tasks.
//!
//! One subscription is held per event subject. Every received message runs
//! in its own task: decode, hand to the handler, log the outcome. Failures
//! are terminal for that message; nothing is retried or requeued.
//!
//! Shutdown unsubscribes first so no new work is accepted, then waits up to
//! the drain timeout for in-flight tasks, then closes the bus. Tasks still
//! running after the timeout are abandoned, not cancelled.

mod lifecycle;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::ApplicationEvent;
use crate::domain::ports::{
    ApplicationEventHandler, BusMessage, EventBus, EventBusError, EventHandlerError, Subscription,
    SubscriptionId,
};

pub use self::lifecycle::{DropReason, MessageState};
use self::lifecycle::MessageLifecycle;

/// Default bound on one message's processing time.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the shutdown drain.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning knobs for [`EventDispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// Per-message processing timeout.
    pub handler_timeout: Duration,
    /// How long shutdown waits for in-flight messages.
    pub drain_timeout: Duration,
    /// Maximum concurrently running handlers; `None` is unbounded.
    ///
    /// When the bound is reached the receive loop waits for a free slot.
    pub max_in_flight: Option<usize>,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            max_in_flight: None,
        }
    }
}

/// Result of [`RunningDispatcher::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight message finished within the drain timeout.
    Drained,
    /// The timeout elapsed with work still running.
    TimedOut {
        /// Messages abandoned.
        abandoned: usize,
    },
}

/// Counts running handler tasks and lets shutdown wait for zero.
#[derive(Clone)]
struct InFlight(Arc<watch::Sender<usize>>);

impl InFlight {
    fn new() -> Self {
        Self(Arc::new(watch::Sender::new(0)))
    }

    fn enter(&self) -> InFlightGuard {
        self.0.send_modify(|count| *count += 1);
        InFlightGuard(self.clone())
    }

    fn current(&self) -> usize {
        *self.0.borrow()
    }

    async fn idle(&self) {
        let mut receiver = self.0.subscribe();
        if receiver.wait_for(|count| *count == 0).await.is_err() {
            debug!("in-flight counter closed");
        }
    }
}

struct InFlightGuard(InFlight);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.0.send_modify(|count| *count = count.saturating_sub(1));
    }
}

struct Worker {
    handler: Arc<dyn ApplicationEventHandler>,
    handler_timeout: Duration,
    in_flight: InFlight,
    limiter: Option<Arc<Semaphore>>,
}

/// Subscribes the handler to every application event subject.
pub struct EventDispatcher {
    bus: Arc<dyn EventBus>,
    handler: Arc<dyn ApplicationEventHandler>,
    settings: DispatcherSettings,
}

impl EventDispatcher {
    /// Build a dispatcher with default settings.
    pub fn new(bus: Arc<dyn EventBus>, handler: Arc<dyn ApplicationEventHandler>) -> Self {
        Self {
            bus,
            handler,
            settings: DispatcherSettings::default(),
        }
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: DispatcherSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Subscribe to every subject and start receiving.
    ///
    /// If any subscription fails, those already made are released and the
    /// error is returned.
    pub async fn start(self) -> Result<RunningDispatcher, EventBusError> {
        let worker = Arc::new(Worker {
            handler: self.handler,
            handler_timeout: self.settings.handler_timeout,
            in_flight: InFlight::new(),
            limiter: self
                .settings
                .max_in_flight
                .map(|limit| Arc::new(Semaphore::new(limit.max(1)))),
        });

        let mut subscriptions: Vec<SubscriptionId> =
            Vec::with_capacity(ApplicationEvent::SUBJECTS.len());
        let mut pumps: Vec<JoinHandle<()>> = Vec::with_capacity(ApplicationEvent::SUBJECTS.len());
        for subject in ApplicationEvent::SUBJECTS {
            let subscription = match self.bus.subscribe(subject).await {
                Ok(subscription) => subscription,
                Err(err) => {
                    for pump in &pumps {
                        pump.abort();
                    }
                    release(self.bus.as_ref(), &subscriptions).await;
                    return Err(err);
                }
            };
            info!(subject, subscription = %subscription.id(), "subscribed");
            subscriptions.push(subscription.id());
            pumps.push(tokio::spawn(pump(subscription, Arc::clone(&worker))));
        }

        Ok(RunningDispatcher {
            bus: self.bus,
            subscriptions,
            pumps,
            worker,
            drain_timeout: self.settings.drain_timeout,
        })
    }
}

/// A started dispatcher. Call [`RunningDispatcher::shutdown`] to stop it.
pub struct RunningDispatcher {
    bus: Arc<dyn EventBus>,
    subscriptions: Vec<SubscriptionId>,
    pumps: Vec<JoinHandle<()>>,
    worker: Arc<Worker>,
    drain_timeout: Duration,
}

impl RunningDispatcher {
    /// Messages currently being processed.
    pub fn in_flight(&self) -> usize {
        self.worker.in_flight.current()
    }

    /// Stop accepting messages, drain in-flight work, and close the bus.
    pub async fn shutdown(self) -> DrainOutcome {
        release(self.bus.as_ref(), &self.subscriptions).await;
        for pump in self.pumps {
            pump.abort();
            let _stopped = pump.await;
        }

        let outcome =
            match tokio::time::timeout(self.drain_timeout, self.worker.in_flight.idle()).await {
                Ok(()) => DrainOutcome::Drained,
                Err(_) => DrainOutcome::TimedOut {
                    abandoned: self.worker.in_flight.current(),
                },
            };
        match outcome {
            DrainOutcome::Drained => info!("event dispatcher drained"),
            DrainOutcome::TimedOut { abandoned } => warn!(
                abandoned,
                timeout_ms = self.drain_timeout.as_millis(),
                "drain timed out; abandoning in-flight messages"
            ),
        }

        if let Err(err) = self.bus.close().await {
            warn!(error = %err, "failed to close event bus");
        }
        outcome
    }
}

async fn release(bus: &dyn EventBus, subscriptions: &[SubscriptionId]) {
    for id in subscriptions {
        if let Err(err) = bus.unsubscribe(*id).await {
            warn!(subscription = %id, error = %err, "failed to unsubscribe");
        }
    }
}

async fn pump(mut subscription: Subscription, worker: Arc<Worker>) {
    while let Some(message) = subscription.next().await {
        let permit = match acquire(worker.limiter.as_ref()).await {
            Ok(permit) => permit,
            Err(()) => break,
        };
        let guard = worker.in_flight.enter();
        let task_worker = Arc::clone(&worker);
        tokio::spawn(async move {
            let _slot = permit;
            let _guard = guard;
            process(message, &task_worker).await;
        });
    }
    debug!(subject = subscription.subject(), "subscription ended");
}

async fn acquire(
    limiter: Option<&Arc<Semaphore>>,
) -> Result<Option<OwnedSemaphorePermit>, ()> {
    match limiter {
        Some(semaphore) => Arc::clone(semaphore)
            .acquire_owned()
            .await
            .map(Some)
            .map_err(|_| ()),
        None => Ok(None),
    }
}

async fn process(message: BusMessage, worker: &Worker) -> MessageState {
    let mut lifecycle = MessageLifecycle::received();
    let subject = message.subject.as_str();

    let event = match ApplicationEvent::decode(subject, &message.payload) {
        Ok(event) => event,
        Err(err) => {
            let (state, elapsed) = lifecycle.drop_with(DropReason::Undecodable);
            warn!(
                subject,
                %state,
                error = %err,
                elapsed_ms = elapsed.as_millis(),
                "dropping undecodable message"
            );
            return state;
        }
    };

    lifecycle.processing();
    let application_id = event.application_id().clone();
    debug!(subject, %application_id, state = %lifecycle.state(), "handling event");

    let outcome = tokio::time::timeout(worker.handler_timeout, handle(worker, &event)).await;
    let (state, elapsed) = match outcome {
        Ok(Ok(())) => lifecycle.complete(),
        Ok(Err(err)) => {
            warn!(subject, %application_id, error = %err, "event handler failed");
            lifecycle.drop_with(DropReason::HandlerFailed)
        }
        Err(_) => {
            warn!(
                subject,
                %application_id,
                timeout_ms = worker.handler_timeout.as_millis(),
                "event handler timed out"
            );
            lifecycle.drop_with(DropReason::TimedOut)
        }
    };
    info!(
        subject,
        %application_id,
        %state,
        elapsed_ms = elapsed.as_millis(),
        "message finished"
    );
    state
}

async fn handle(worker: &Worker, event: &ApplicationEvent) -> Result<(), EventHandlerError> {
    match event {
        ApplicationEvent::Created(created) => worker.handler.on_created(created).await,
        ApplicationEvent::StatusUpdated(updated) => {
            worker.handler.on_status_updated(updated).await
        }
    }
}

#[cfg(test)]
mod tests;
