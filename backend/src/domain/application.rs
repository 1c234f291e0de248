//! Adoption application records and their review status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{normalise_optional_text, storage_instant};
use super::{Entity, EntityId, EntityKind, Error};

/// Review status of an adoption application.
///
/// `Unspecified` exists so callers can express "no status given"; it is
/// never accepted as a transition target and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    /// No status supplied.
    Unspecified,
    /// Awaiting review; every new application starts here.
    PendingReview,
    /// Accepted by a reviewer.
    Approved,
    /// Declined by a reviewer.
    Rejected,
    /// Withdrawn by the applicant.
    CancelledByUser,
}

impl ApplicationStatus {
    /// Wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::PendingReview => "PENDING_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::CancelledByUser => "CANCELLED_BY_USER",
        }
    }

    /// Whether the status may be stored on an application.
    pub const fn is_specified(self) -> bool {
        !matches!(self, Self::Unspecified)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "UNSPECIFIED" => Ok(Self::Unspecified),
            "PENDING_REVIEW" => Ok(Self::PendingReview),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "CANCELLED_BY_USER" => Ok(Self::CancelledByUser),
            other => Err(Error::invalid_request(format!(
                "unknown application status: {other}"
            ))),
        }
    }
}

/// A user's request to adopt a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Identifier assigned at creation.
    pub id: EntityId,
    /// User who applied. Not checked against the user store.
    #[serde(rename = "user_id")]
    pub applicant_id: EntityId,
    /// Pet applied for. Not checked against the pet store.
    #[serde(rename = "pet_id")]
    pub subject_id: EntityId,
    /// Current review status.
    pub status: ApplicationStatus,
    /// Notes supplied by the applicant.
    #[serde(default)]
    pub application_notes: Option<String>,
    /// Notes supplied by the reviewer.
    #[serde(default)]
    pub review_notes: Option<String>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewApplication {
    /// Raw applicant identifier.
    #[serde(default, alias = "user_id")]
    pub applicant_id: String,
    /// Raw pet identifier.
    #[serde(default, alias = "pet_id")]
    pub subject_id: String,
    /// Optional applicant notes.
    #[serde(default)]
    pub application_notes: Option<String>,
}

/// Partial update of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationPatch {
    /// New review status, if changing.
    pub status: Option<ApplicationStatus>,
    /// Replacement review notes, stored exactly as given; `Some(None)` clears them.
    pub review_notes: Option<Option<String>>,
}

impl Entity for Application {
    const KIND: EntityKind = EntityKind::Application;
    type Draft = NewApplication;
    type Patch = ApplicationPatch;

    fn from_draft(id: EntityId, draft: Self::Draft, now: DateTime<Utc>) -> Result<Self, Error> {
        let applicant_id = EntityId::parse_field("applicant_id", draft.applicant_id.trim())?;
        let subject_id = EntityId::parse_field("subject_id", draft.subject_id.trim())?;
        let now = storage_instant(now);
        Ok(Self {
            id,
            applicant_id,
            subject_id,
            status: ApplicationStatus::PendingReview,
            application_notes: normalise_optional_text(draft.application_notes),
            review_notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), Error> {
        if let Some(status) = patch.status {
            if !status.is_specified() {
                return Err(Error::invalid_request("status must be specified")
                    .with_details(serde_json::json!({ "field": "status" })));
            }
            self.status = status;
        }
        if let Some(notes) = patch.review_notes {
            self.review_notes = notes;
        }
        Ok(())
    }

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}
