//! Shared adapters for exercising the domain without external services.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ports::{
    ApplicationEventHandler, CacheLookup, DirectoryError, EntityCache, EntityCacheError,
    EntityStore, EntityStoreError, EventHandlerError, Mailer, MailerError, OutboundEmail,
    PetDirectory, PetSummary, UserContact, UserDirectory,
};
use crate::domain::{
    ApplicationCreated, ApplicationEvent, ApplicationStatusUpdated, Entity, EntityId, ListQuery,
    Page,
};
use crate::outbound::cache::InMemoryEntityCache;

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex"),
    }
}

/// Store wrapper counting point reads.
pub struct CountingStore<E> {
    inner: Arc<dyn EntityStore<E>>,
    reads: AtomicUsize,
}

impl<E: Entity> CountingStore<E> {
    pub fn new(inner: Arc<dyn EntityStore<E>>) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for CountingStore<E> {
    async fn create(&self, entity: &E) -> Result<(), EntityStoreError> {
        self.inner.create(entity).await
    }

    async fn get_by_id(&self, id: &EntityId) -> Result<Option<E>, EntityStoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(id).await
    }

    async fn update(&self, entity: &E) -> Result<(), EntityStoreError> {
        self.inner.update(entity).await
    }

    async fn delete(&self, id: &EntityId) -> Result<(), EntityStoreError> {
        self.inner.delete(id).await
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<E>, EntityStoreError> {
        self.inner.list(query).await
    }
}

/// In-memory cache whose operations can be switched to fail.
pub struct FlakyCache<E> {
    inner: InMemoryEntityCache<E>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl<E: Entity> Default for FlakyCache<E> {
    fn default() -> Self {
        Self {
            inner: InMemoryEntityCache::new(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }
}

impl<E: Entity> FlakyCache<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, failing: bool) {
        self.fail_deletes.store(failing, Ordering::SeqCst);
    }

    /// Number of live entries, ignoring the failure switches.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn check(flag: &AtomicBool) -> Result<(), EntityCacheError> {
        if flag.load(Ordering::SeqCst) {
            return Err(EntityCacheError::backend("cache offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl<E: Entity> EntityCache<E> for FlakyCache<E> {
    async fn get(&self, id: &EntityId) -> Result<CacheLookup<E>, EntityCacheError> {
        Self::check(&self.fail_reads)?;
        self.inner.get(id).await
    }

    async fn set(&self, entity: &E, ttl: Duration) -> Result<(), EntityCacheError> {
        Self::check(&self.fail_writes)?;
        self.inner.set(entity, ttl).await
    }

    async fn delete(&self, id: &EntityId) -> Result<(), EntityCacheError> {
        Self::check(&self.fail_deletes)?;
        self.inner.delete(id).await
    }
}

/// Mailer that keeps every email it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.failing.store(true, Ordering::SeqCst);
        mailer
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        lock(&self.sent, "mailer").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailerError::transport("relay refused connection"));
        }
        lock(&self.sent, "mailer").push(email.clone());
        Ok(())
    }
}

/// Fixed set of user contacts.
#[derive(Default)]
pub struct StaticUserDirectory {
    users: HashMap<EntityId, UserContact>,
}

impl StaticUserDirectory {
    #[must_use]
    pub fn with_user(mut self, id: &str, email: &str, full_name: Option<&str>) -> Self {
        let id = parse_id(id);
        self.users.insert(
            id.clone(),
            UserContact {
                id,
                email: email.to_owned(),
                full_name: full_name.map(str::to_owned),
            },
        );
        self
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn get_user(&self, id: &EntityId) -> Result<UserContact, DirectoryError> {
        self.users
            .get(id)
            .cloned()
            .ok_or_else(|| DirectoryError::not_found(id.as_str()))
    }
}

/// Fixed set of pet summaries.
#[derive(Default)]
pub struct StaticPetDirectory {
    pets: HashMap<EntityId, PetSummary>,
}

impl StaticPetDirectory {
    #[must_use]
    pub fn with_pet(mut self, id: &str, name: &str) -> Self {
        let id = parse_id(id);
        self.pets.insert(
            id.clone(),
            PetSummary {
                id,
                name: name.to_owned(),
            },
        );
        self
    }
}

#[async_trait]
impl PetDirectory for StaticPetDirectory {
    async fn get_pet(&self, id: &EntityId) -> Result<PetSummary, DirectoryError> {
        self.pets
            .get(id)
            .cloned()
            .ok_or_else(|| DirectoryError::not_found(id.as_str()))
    }
}

fn parse_id(raw: &str) -> EntityId {
    match EntityId::new(raw) {
        Ok(id) => id,
        Err(error) => panic!("invalid fixture id {raw:?}: {error}"),
    }
}

/// Handler that records the events it sees, optionally slowly or failing.
#[derive(Default)]
pub struct RecordingHandler {
    seen: Mutex<Vec<ApplicationEvent>>,
    delay: Option<Duration>,
    failing: bool,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn seen(&self) -> Vec<ApplicationEvent> {
        lock(&self.seen, "handler").clone()
    }

    async fn record(&self, event: ApplicationEvent) -> Result<(), EventHandlerError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.seen, "handler").push(event);
        if self.failing {
            return Err(EventHandlerError::delivery("recording handler set to fail"));
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationEventHandler for RecordingHandler {
    async fn on_created(&self, event: &ApplicationCreated) -> Result<(), EventHandlerError> {
        self.record(ApplicationEvent::Created(event.clone())).await
    }

    async fn on_status_updated(
        &self,
        event: &ApplicationStatusUpdated,
    ) -> Result<(), EventHandlerError> {
        self.record(ApplicationEvent::StatusUpdated(event.clone()))
            .await
    }
}
