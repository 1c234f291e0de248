//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::{test as actix_test, web};
use mockable::DefaultClock;
use serde::de::DeserializeOwned;

use crate::domain::{ApplicationWorkflow, CacheAsideRepository, PetService, UserService};
use crate::inbound::http::health::HealthState;
use crate::outbound::bus::{BusApplicationEventPublisher, InMemoryEventBus};
use crate::outbound::cache::InMemoryEntityCache;
use crate::outbound::persistence::InMemoryEntityStore;

/// Service handles wired to in-memory adapters.
pub struct TestServices {
    pub users: web::Data<UserService>,
    pub pets: web::Data<PetService>,
    pub applications: web::Data<ApplicationWorkflow>,
    pub health: web::Data<HealthState>,
}

fn repository<E: crate::domain::Entity>() -> CacheAsideRepository<E> {
    CacheAsideRepository::new(
        Arc::new(InMemoryEntityStore::<E>::new()),
        Arc::new(InMemoryEntityCache::<E>::new()),
        Arc::new(DefaultClock),
    )
}

/// Build every service over fresh in-memory stores, caches and bus.
pub fn in_memory_services() -> TestServices {
    let bus = Arc::new(InMemoryEventBus::new());
    let publisher = Arc::new(BusApplicationEventPublisher::new(bus));
    let health = HealthState::new();
    health.mark_serving();
    TestServices {
        users: web::Data::new(UserService::new(repository())),
        pets: web::Data::new(PetService::new(repository())),
        applications: web::Data::new(ApplicationWorkflow::new(repository(), publisher)),
        health: web::Data::new(health),
    }
}

/// Read and decode a JSON response body.
pub async fn read_json<T, B>(response: ServiceResponse<B>) -> T
where
    T: DeserializeOwned,
    B: MessageBody,
{
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON response body")
}
