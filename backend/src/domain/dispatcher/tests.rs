//! Tests for the event dispatcher.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::*;
use crate::domain::ports::MockApplicationEventHandler;
use crate::domain::{
    APPLICATION_CREATED_SUBJECT, APPLICATION_STATUS_UPDATED_SUBJECT, Application,
    ApplicationCreated, ApplicationStatus, ApplicationStatusUpdated, EntityId,
};
use crate::outbound::bus::InMemoryEventBus;
use crate::test_support::doubles::RecordingHandler;

fn application(id: &str) -> Application {
    let at = Utc
        .with_ymd_and_hms(2026, 3, 3, 9, 0, 0)
        .single()
        .expect("valid instant");
    Application {
        id: EntityId::new(id).expect("valid id"),
        applicant_id: EntityId::new("user123").expect("valid id"),
        subject_id: EntityId::new("pet456").expect("valid id"),
        status: ApplicationStatus::Approved,
        application_notes: None,
        review_notes: Some("looks good".to_owned()),
        created_at: at,
        updated_at: at,
    }
}

fn created_payload(id: &str) -> Vec<u8> {
    ApplicationEvent::Created(ApplicationCreated::from(&application(id)))
        .encode()
        .expect("encodes")
}

fn updated_payload(id: &str) -> Vec<u8> {
    ApplicationEvent::StatusUpdated(ApplicationStatusUpdated::from(&application(id)))
        .encode()
        .expect("encodes")
}

async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn routes_each_subject_to_its_handler_method() {
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = Arc::new(RecordingHandler::new());
    let running = EventDispatcher::new(bus.clone(), handler.clone())
        .start()
        .await
        .expect("started");

    bus.publish(APPLICATION_CREATED_SUBJECT, created_payload("app1"))
        .await
        .expect("published");
    bus.publish(APPLICATION_STATUS_UPDATED_SUBJECT, updated_payload("app2"))
        .await
        .expect("published");

    eventually(|| handler.seen().len() == 2).await;
    let seen = handler.seen();
    assert!(seen.iter().any(|event| matches!(event, ApplicationEvent::Created(c) if c.application_id.as_str() == "app1")));
    assert!(seen.iter().any(|event| matches!(event, ApplicationEvent::StatusUpdated(u) if u.review_notes == "looks good")));

    assert_eq!(running.shutdown().await, DrainOutcome::Drained);
}

#[tokio::test]
async fn malformed_payloads_are_dropped_without_calling_handler() {
    let bus = Arc::new(InMemoryEventBus::new());
    let mut handler = MockApplicationEventHandler::new();
    handler.expect_on_created().never();
    handler.expect_on_status_updated().never();
    let running = EventDispatcher::new(bus.clone(), Arc::new(handler))
        .start()
        .await
        .expect("started");

    bus.publish(APPLICATION_CREATED_SUBJECT, b"{not json".to_vec())
        .await
        .expect("published");
    bus.publish(APPLICATION_STATUS_UPDATED_SUBJECT, created_payload("app1"))
        .await
        .expect("published");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(running.in_flight(), 0);
    assert_eq!(running.shutdown().await, DrainOutcome::Drained);
}

#[tokio::test]
async fn decode_failures_do_not_stop_later_messages() {
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = Arc::new(RecordingHandler::new());
    let running = EventDispatcher::new(bus.clone(), handler.clone())
        .start()
        .await
        .expect("started");

    bus.publish(APPLICATION_CREATED_SUBJECT, b"garbage".to_vec())
        .await
        .expect("published");
    bus.publish(APPLICATION_CREATED_SUBJECT, created_payload("app1"))
        .await
        .expect("published");

    eventually(|| handler.seen().len() == 1).await;
    running.shutdown().await;
}

#[tokio::test]
async fn handler_failures_are_not_redelivered() {
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = Arc::new(RecordingHandler::new().failing());
    let running = EventDispatcher::new(bus.clone(), handler.clone())
        .start()
        .await
        .expect("started");

    bus.publish(APPLICATION_CREATED_SUBJECT, created_payload("app1"))
        .await
        .expect("published");
    eventually(|| handler.seen().len() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(handler.seen().len(), 1);
    assert_eq!(running.shutdown().await, DrainOutcome::Drained);
}

#[tokio::test]
async fn shutdown_waits_for_in_flight_handlers_then_closes_bus() {
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = Arc::new(RecordingHandler::new().with_delay(Duration::from_millis(100)));
    let running = EventDispatcher::new(bus.clone(), handler.clone())
        .start()
        .await
        .expect("started");
    assert_eq!(bus.subscriber_count(), 2);

    bus.publish(APPLICATION_CREATED_SUBJECT, created_payload("app1"))
        .await
        .expect("published");
    eventually(|| running.in_flight() == 1).await;

    let outcome = running.shutdown().await;

    assert_eq!(outcome, DrainOutcome::Drained);
    assert_eq!(handler.seen().len(), 1);
    assert_eq!(bus.subscriber_count(), 0);
    assert!(matches!(
        bus.publish(APPLICATION_CREATED_SUBJECT, created_payload("app2"))
            .await,
        Err(EventBusError::Closed)
    ));
}

#[tokio::test(start_paused = true)]
async fn drain_gives_up_after_timeout() {
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = Arc::new(RecordingHandler::new().with_delay(Duration::from_secs(20)));
    let running = EventDispatcher::new(bus.clone(), handler)
        .with_settings(DispatcherSettings {
            drain_timeout: Duration::from_millis(100),
            ..DispatcherSettings::default()
        })
        .start()
        .await
        .expect("started");

    bus.publish(APPLICATION_CREATED_SUBJECT, created_payload("app1"))
        .await
        .expect("published");
    eventually(|| running.in_flight() == 1).await;

    assert_eq!(
        running.shutdown().await,
        DrainOutcome::TimedOut { abandoned: 1 }
    );
}

#[tokio::test(start_paused = true)]
async fn slow_handlers_time_out_and_release_their_slot() {
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = Arc::new(RecordingHandler::new().with_delay(Duration::from_secs(60)));
    let running = EventDispatcher::new(bus.clone(), handler.clone())
        .with_settings(DispatcherSettings {
            handler_timeout: Duration::from_millis(200),
            ..DispatcherSettings::default()
        })
        .start()
        .await
        .expect("started");

    bus.publish(APPLICATION_CREATED_SUBJECT, created_payload("app1"))
        .await
        .expect("published");
    eventually(|| running.in_flight() == 1).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(running.in_flight(), 0);
    assert!(handler.seen().is_empty());
    running.shutdown().await;
}

#[derive(Default)]
struct ConcurrencyTracker {
    current: AtomicUsize,
    peak: AtomicUsize,
    handled: AtomicUsize,
}

impl ConcurrencyTracker {
    async fn observe(&self) -> Result<(), EventHandlerError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.handled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ApplicationEventHandler for ConcurrencyTracker {
    async fn on_created(&self, _event: &ApplicationCreated) -> Result<(), EventHandlerError> {
        self.observe().await
    }

    async fn on_status_updated(
        &self,
        _event: &ApplicationStatusUpdated,
    ) -> Result<(), EventHandlerError> {
        self.observe().await
    }
}

#[tokio::test]
async fn max_in_flight_bounds_concurrent_handlers() {
    let bus = Arc::new(InMemoryEventBus::new());
    let tracker = Arc::new(ConcurrencyTracker::default());
    let running = EventDispatcher::new(bus.clone(), tracker.clone())
        .with_settings(DispatcherSettings {
            max_in_flight: Some(1),
            ..DispatcherSettings::default()
        })
        .start()
        .await
        .expect("started");

    for id in ["app1", "app2", "app3"] {
        bus.publish(APPLICATION_CREATED_SUBJECT, created_payload(id))
            .await
            .expect("published");
    }
    eventually(|| tracker.handled.load(Ordering::SeqCst) == 3).await;

    assert_eq!(tracker.peak.load(Ordering::SeqCst), 1);
    running.shutdown().await;
}

#[tokio::test]
async fn unbounded_dispatch_runs_handlers_concurrently() {
    let bus = Arc::new(InMemoryEventBus::new());
    let tracker = Arc::new(ConcurrencyTracker::default());
    let running = EventDispatcher::new(bus.clone(), tracker.clone())
        .start()
        .await
        .expect("started");

    for id in ["app1", "app2", "app3"] {
        bus.publish(APPLICATION_CREATED_SUBJECT, created_payload(id))
            .await
            .expect("published");
    }
    eventually(|| tracker.handled.load(Ordering::SeqCst) == 3).await;

    assert!(tracker.peak.load(Ordering::SeqCst) > 1);
    running.shutdown().await;
}

#[tokio::test]
async fn failed_subscription_releases_earlier_ones() {
    let mut bus = crate::domain::ports::MockEventBus::new();
    let (_sender, receiver) = tokio::sync::mpsc::channel(1);
    let mut receivers = Some(receiver);
    bus.expect_subscribe()
        .withf(|subject: &str| subject == APPLICATION_CREATED_SUBJECT)
        .times(1)
        .returning(move |subject| {
            let receiver = receivers.take().expect("single subscription");
            Ok(Subscription::new(SubscriptionId::new(1), subject, receiver))
        });
    bus.expect_subscribe()
        .withf(|subject: &str| subject == APPLICATION_STATUS_UPDATED_SUBJECT)
        .times(1)
        .returning(|subject| Err(EventBusError::subscribe(subject, "denied")));
    bus.expect_unsubscribe()
        .withf(|id: &SubscriptionId| *id == SubscriptionId::new(1))
        .times(1)
        .returning(|_| Ok(()));

    let result = EventDispatcher::new(Arc::new(bus), Arc::new(RecordingHandler::new()))
        .start()
        .await;

    assert!(matches!(result, Err(EventBusError::Subscribe { .. })));
}
