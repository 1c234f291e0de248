//! Domain model and services for the adoption platform.
//!
//! Purpose: define the user, pet and application records, the rules for
//! creating and changing them, and the services that drive those rules
//! through the ports in [`ports`]. Nothing here knows about HTTP, Postgres,
//! Redis or SMTP.
//!
//! Public surface:
//! - Error / ErrorCode: failure taxonomy shared by every layer.
//! - Entity, EntityId, EntityKind: the shape every stored record shares.
//! - CacheAsideRepository: read-through, invalidate-on-write storage facade.
//! - ApplicationWorkflow, UserService, PetService: the synchronous services.
//! - EventDispatcher, NotificationComposer: the asynchronous event consumer.

pub mod application;
pub mod application_workflow;
pub mod cache_aside;
pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod events;
pub mod notifications;
pub mod pagination;
pub mod pet;
pub mod pet_service;
pub mod ports;
pub mod user;
pub mod user_service;

pub use self::application::{Application, ApplicationPatch, ApplicationStatus, NewApplication};
pub use self::application_workflow::ApplicationWorkflow;
pub use self::cache_aside::{CacheAsideRepository, DEFAULT_CACHE_TTL};
pub use self::dispatcher::{
    DispatcherSettings, DrainOutcome, DropReason, EventDispatcher, MessageState,
    RunningDispatcher,
};
pub use self::entity::{
    Entity, EntityId, EntityIdValidationError, EntityKind, next_update_instant, storage_instant,
};
pub use self::error::{Error, ErrorCode};
pub use self::events::{
    APPLICATION_CREATED_EVENT, APPLICATION_CREATED_SUBJECT, APPLICATION_STATUS_UPDATED_EVENT,
    APPLICATION_STATUS_UPDATED_SUBJECT, ApplicationCreated, ApplicationEvent,
    ApplicationStatusUpdated, EventDecodeError,
};
pub use self::notifications::NotificationComposer;
pub use self::pagination::{FieldFilter, ListQuery, Page, PageRequest};
pub use self::pet::{NewPet, Pet, PetAdoptionStatus, PetPatch};
pub use self::pet_service::{PetFilter, PetService};
pub use self::user::{NewUser, User, UserPatch};
pub use self::user_service::UserService;

