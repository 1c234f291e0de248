//! Registered users of the adoption platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{normalise_optional_text, require_text, storage_instant};
use super::{Entity, EntityId, EntityKind, Error};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier assigned at creation.
    pub id: EntityId,
    /// Unique login handle.
    pub username: String,
    /// Unique contact address used for notifications.
    pub email: String,
    /// Display name; may be absent.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    /// Requested login handle.
    #[serde(default)]
    pub username: String,
    /// Contact address.
    #[serde(default)]
    pub email: String,
    /// Optional display name.
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Partial profile update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserPatch {
    /// Replacement login handle.
    #[serde(default)]
    pub username: Option<String>,
    /// Replacement display name.
    #[serde(default)]
    pub full_name: Option<String>,
}

fn validate_email(email: String) -> Result<String, Error> {
    let email = require_text("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::invalid_request("email must be a valid address")
            .with_details(serde_json::json!({ "field": "email", "code": "invalid_email" }))),
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
    type Draft = NewUser;
    type Patch = UserPatch;

    fn from_draft(id: EntityId, draft: Self::Draft, now: DateTime<Utc>) -> Result<Self, Error> {
        let username = require_text("username", draft.username)?;
        let email = validate_email(draft.email)?;
        let now = storage_instant(now);
        Ok(Self {
            id,
            username,
            email,
            full_name: normalise_optional_text(draft.full_name),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), Error> {
        if let Some(username) = patch.username {
            self.username = require_text("username", username)?;
        }
        if let Some(full_name) = patch.full_name {
            self.full_name = normalise_optional_text(Some(full_name));
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
