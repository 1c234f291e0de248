//! Pets listed for adoption.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{normalise_optional_text, require_text, storage_instant};
use super::{Entity, EntityId, EntityKind, Error};

/// Where a pet is in the adoption process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PetAdoptionStatus {
    /// Open for applications.
    #[default]
    Available,
    /// An application is being processed.
    PendingAdoption,
    /// Adopted; `adopted_by_user_id` names the adopter.
    Adopted,
}

impl PetAdoptionStatus {
    /// Wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::PendingAdoption => "PENDING_ADOPTION",
            Self::Adopted => "ADOPTED",
        }
    }
}

impl fmt::Display for PetAdoptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetAdoptionStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(Self::Available),
            "PENDING_ADOPTION" => Ok(Self::PendingAdoption),
            "ADOPTED" => Ok(Self::Adopted),
            other => Err(Error::invalid_request(format!(
                "unknown adoption status: {other}"
            ))),
        }
    }
}

/// A pet listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    /// Identifier assigned at creation.
    pub id: EntityId,
    /// Name shown in notifications.
    pub name: String,
    /// Species, for example "dog".
    pub species: String,
    /// Breed, if known.
    #[serde(default)]
    pub breed: Option<String>,
    /// Age in years.
    pub age: u32,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Current adoption status.
    pub adoption_status: PetAdoptionStatus,
    /// User who listed the pet.
    #[serde(default)]
    pub listed_by_user_id: Option<EntityId>,
    /// Adopter, present only once adopted.
    #[serde(default)]
    pub adopted_by_user_id: Option<EntityId>,
    /// Photo URLs.
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new pet listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewPet {
    /// Pet name.
    #[serde(default)]
    pub name: String,
    /// Species.
    #[serde(default)]
    pub species: String,
    /// Optional breed.
    #[serde(default)]
    pub breed: Option<String>,
    /// Age in years.
    #[serde(default)]
    pub age: u32,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Listing user.
    #[serde(default)]
    pub listed_by_user_id: Option<EntityId>,
    /// Photo URLs.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Partial pet update. Only present fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PetPatch {
    /// Replacement name.
    #[serde(default)]
    pub name: Option<String>,
    /// Replacement species.
    #[serde(default)]
    pub species: Option<String>,
    /// Replacement breed.
    #[serde(default)]
    pub breed: Option<String>,
    /// Replacement age.
    #[serde(default)]
    pub age: Option<u32>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement photo URLs.
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    /// Status change; see [`PetPatch::adoption`].
    #[serde(skip)]
    pub adoption: Option<(PetAdoptionStatus, Option<EntityId>)>,
}

impl PetPatch {
    /// Patch that only moves the pet to a new adoption status.
    pub fn adoption(status: PetAdoptionStatus, adopter: Option<EntityId>) -> Self {
        Self {
            adoption: Some((status, adopter)),
            ..Self::default()
        }
    }
}

fn clean_urls(urls: Vec<String>) -> Vec<String> {
    urls.into_iter()
        .map(|url| url.trim().to_owned())
        .filter(|url| !url.is_empty())
        .collect()
}

impl Entity for Pet {
    const KIND: EntityKind = EntityKind::Pet;
    type Draft = NewPet;
    type Patch = PetPatch;

    fn from_draft(id: EntityId, draft: Self::Draft, now: DateTime<Utc>) -> Result<Self, Error> {
        let name = require_text("name", draft.name)?;
        let species = require_text("species", draft.species)?;
        let now = storage_instant(now);
        Ok(Self {
            id,
            name,
            species,
            breed: normalise_optional_text(draft.breed),
            age: draft.age,
            description: normalise_optional_text(draft.description),
            adoption_status: PetAdoptionStatus::Available,
            listed_by_user_id: draft.listed_by_user_id,
            adopted_by_user_id: None,
            image_urls: clean_urls(draft.image_urls),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), Error> {
        if let Some(name) = patch.name {
            self.name = require_text("name", name)?;
        }
        if let Some(species) = patch.species {
            self.species = require_text("species", species)?;
        }
        if let Some(breed) = patch.breed {
            self.breed = normalise_optional_text(Some(breed));
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(description) = patch.description {
            self.description = normalise_optional_text(Some(description));
        }
        if let Some(urls) = patch.image_urls {
            self.image_urls = clean_urls(urls);
        }
        if let Some((status, adopter)) = patch.adoption {
            self.adopted_by_user_id = match (status, adopter) {
                (PetAdoptionStatus::Adopted, Some(adopter)) => Some(adopter),
                (PetAdoptionStatus::Adopted, None) => {
                    return Err(Error::missing_field("adopted_by_user_id"));
                }
                (_, _) => None,
            };
            self.adoption_status = status;
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
