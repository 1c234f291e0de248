//! Application events exchanged over the bus.
//!
//! Payloads are JSON with stable snake_case field names and RFC 3339 UTC
//! timestamps. Each event kind travels under a fixed subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Application, ApplicationStatus, EntityId};

/// Subject carrying [`ApplicationCreated`] payloads.
pub const APPLICATION_CREATED_SUBJECT: &str = "application.created";

/// Subject carrying [`ApplicationStatusUpdated`] payloads.
pub const APPLICATION_STATUS_UPDATED_SUBJECT: &str = "application.status.updated";

/// `event_type` value of [`ApplicationCreated`].
pub const APPLICATION_CREATED_EVENT: &str = "AdoptionApplicationCreated";

/// `event_type` value of [`ApplicationStatusUpdated`].
pub const APPLICATION_STATUS_UPDATED_EVENT: &str = "AdoptionApplicationStatusUpdated";

/// Emitted once per successfully created application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCreated {
    /// Always [`APPLICATION_CREATED_EVENT`].
    pub event_type: String,
    /// Created application.
    pub application_id: EntityId,
    /// Applicant.
    pub user_id: EntityId,
    /// Pet applied for.
    pub pet_id: EntityId,
    /// Status at creation.
    pub status: ApplicationStatus,
    /// Creation instant.
    pub applied_at: DateTime<Utc>,
}

impl From<&Application> for ApplicationCreated {
    fn from(application: &Application) -> Self {
        Self {
            event_type: APPLICATION_CREATED_EVENT.to_owned(),
            application_id: application.id.clone(),
            user_id: application.applicant_id.clone(),
            pet_id: application.subject_id.clone(),
            status: application.status,
            applied_at: application.created_at,
        }
    }
}

/// Emitted once per successful status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStatusUpdated {
    /// Always [`APPLICATION_STATUS_UPDATED_EVENT`].
    pub event_type: String,
    /// Updated application.
    pub application_id: EntityId,
    /// Applicant.
    pub user_id: EntityId,
    /// Pet applied for.
    pub pet_id: EntityId,
    /// Status after the update.
    pub new_status: ApplicationStatus,
    /// Update instant.
    pub updated_at: DateTime<Utc>,
    /// Reviewer notes; empty when none were given.
    #[serde(default)]
    pub review_notes: String,
}

impl From<&Application> for ApplicationStatusUpdated {
    fn from(application: &Application) -> Self {
        Self {
            event_type: APPLICATION_STATUS_UPDATED_EVENT.to_owned(),
            application_id: application.id.clone(),
            user_id: application.applicant_id.clone(),
            pet_id: application.subject_id.clone(),
            new_status: application.status,
            updated_at: application.updated_at,
            review_notes: application.review_notes.clone().unwrap_or_default(),
        }
    }
}

/// Errors raised while decoding a bus payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventDecodeError {
    /// No event kind is routed on this subject.
    #[error("no event is routed on subject {subject}")]
    UnknownSubject {
        /// Offending subject.
        subject: String,
    },
    /// The payload was not a valid event for its subject.
    #[error("malformed payload on {subject}: {message}")]
    Malformed {
        /// Subject the payload arrived on.
        subject: String,
        /// Decoder diagnostic.
        message: String,
    },
}

/// A decoded application event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationEvent {
    /// See [`ApplicationCreated`].
    Created(ApplicationCreated),
    /// See [`ApplicationStatusUpdated`].
    StatusUpdated(ApplicationStatusUpdated),
}

impl ApplicationEvent {
    /// Subjects the dispatcher must subscribe to.
    pub const SUBJECTS: [&'static str; 2] = [
        APPLICATION_CREATED_SUBJECT,
        APPLICATION_STATUS_UPDATED_SUBJECT,
    ];

    /// Subject this event is published under.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Created(_) => APPLICATION_CREATED_SUBJECT,
            Self::StatusUpdated(_) => APPLICATION_STATUS_UPDATED_SUBJECT,
        }
    }

    /// Application the event concerns.
    pub fn application_id(&self) -> &EntityId {
        match self {
            Self::Created(event) => &event.application_id,
            Self::StatusUpdated(event) => &event.application_id,
        }
    }

    /// Serialize the payload to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Created(event) => serde_json::to_vec(event),
            Self::StatusUpdated(event) => serde_json::to_vec(event),
        }
    }

    /// Decode a payload received on `subject`.
    ///
    /// # Examples
    /// ```
    /// use adoption_backend::domain::ApplicationEvent;
    ///
    /// let result = ApplicationEvent::decode("application.created", b"not json");
    /// assert!(result.is_err());
    /// ```
    pub fn decode(subject: &str, payload: &[u8]) -> Result<Self, EventDecodeError> {
        let malformed = |message: String| EventDecodeError::Malformed {
            subject: subject.to_owned(),
            message,
        };
        match subject {
            APPLICATION_CREATED_SUBJECT => {
                let event: ApplicationCreated =
                    serde_json::from_slice(payload).map_err(|err| malformed(err.to_string()))?;
                check_event_type(&event.event_type, APPLICATION_CREATED_EVENT)
                    .map_err(malformed)?;
                Ok(Self::Created(event))
            }
            APPLICATION_STATUS_UPDATED_SUBJECT => {
                let event: ApplicationStatusUpdated =
                    serde_json::from_slice(payload).map_err(|err| malformed(err.to_string()))?;
                check_event_type(&event.event_type, APPLICATION_STATUS_UPDATED_EVENT)
                    .map_err(malformed)?;
                Ok(Self::StatusUpdated(event))
            }
            other => Err(EventDecodeError::UnknownSubject {
                subject: other.to_owned(),
            }),
        }
    }
}

fn check_event_type(actual: &str, expected: &str) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected event_type {expected}, got {actual:?}"))
    }
}
