//! Shared shape of the user, pet and application records.
//!
//! Every stored record carries an immutable identifier and a pair of UTC
//! timestamps. The [`Entity`] trait captures that shape together with the
//! kind-specific creation and partial-update rules so the cache-aside
//! repository can be written once for all three keyspaces.

use std::fmt;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Error;

/// Validation errors returned by [`EntityId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityIdValidationError {
    /// The identifier was empty.
    #[error("entity id must not be empty")]
    Empty,
    /// The identifier carried leading or trailing whitespace.
    #[error("entity id must not contain surrounding whitespace")]
    Whitespace,
}

/// Stable identifier assigned when a record is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Validate and construct an identifier.
    ///
    /// # Examples
    /// ```
    /// use adoption_backend::domain::EntityId;
    ///
    /// assert!(EntityId::new("user123").is_ok());
    /// assert!(EntityId::new("  ").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, EntityIdValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(EntityIdValidationError::Empty);
        }
        if value.trim() != value {
            return Err(EntityIdValidationError::Whitespace);
        }
        Ok(Self(value))
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Parse a caller-supplied identifier, naming the field on failure.
    pub fn parse_field(field: &str, value: &str) -> Result<Self, Error> {
        Self::new(value).map_err(|err| match err {
            EntityIdValidationError::Empty => Error::missing_field(field),
            EntityIdValidationError::Whitespace => Error::invalid_request(format!("{field}: {err}"))
                .with_details(serde_json::json!({ "field": field, "code": "invalid_id" })),
        })
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

/// The three independent keyspaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Registered adopters and listers.
    User,
    /// Animals listed for adoption.
    Pet,
    /// Adoption applications.
    Application,
}

impl EntityKind {
    /// Discriminator used by persistent stores.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Pet => "pet",
            Self::Application => "application",
        }
    }

    /// Prefix prepended to identifiers to form cache keys.
    pub const fn cache_prefix(self) -> &'static str {
        match self {
            Self::User => "usercache:",
            Self::Pet => "petcache:",
            Self::Application => "adoptioncache:",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record owned by one entity store.
///
/// Implementations supply the kind-specific rules; the generic repository
/// supplies identity, timestamps and caching.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Keyspace this record lives in.
    const KIND: EntityKind;

    /// Caller-supplied fields for a new record.
    type Draft: Send + 'static;

    /// Partial update; absent fields are left untouched.
    type Patch: Send + 'static;

    /// Validate a draft and build the record with the given id and creation time.
    fn from_draft(id: EntityId, draft: Self::Draft, now: DateTime<Utc>) -> Result<Self, Error>;

    /// Validate and apply a partial update in place.
    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), Error>;

    /// Identifier assigned at creation.
    fn id(&self) -> &EntityId;

    /// Creation instant.
    fn created_at(&self) -> DateTime<Utc>;

    /// Last modification instant.
    fn updated_at(&self) -> DateTime<Utc>;

    /// Overwrite the last modification instant.
    fn set_updated_at(&mut self, at: DateTime<Utc>);
}

/// Truncate to the microsecond precision that stores round-trip faithfully.
pub fn storage_instant(now: DateTime<Utc>) -> DateTime<Utc> {
    now.trunc_subsecs(6)
}

/// Pick the next `updated_at` so that it is strictly after `previous`.
///
/// # Examples
/// ```
/// use adoption_backend::domain::next_update_instant;
/// use chrono::{TimeZone, Utc};
///
/// let previous = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
/// assert!(next_update_instant(previous, previous) > previous);
/// ```
pub fn next_update_instant(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let candidate = storage_instant(now);
    if candidate > previous {
        candidate
    } else {
        previous + TimeDelta::microseconds(1)
    }
}

/// Trim optional free text, collapsing blank values to `None`.
pub(crate) fn normalise_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Require a non-blank text field.
pub(crate) fn require_text(field: &str, value: String) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::missing_field(field));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("", EntityIdValidationError::Empty)]
    #[case(" pet456", EntityIdValidationError::Whitespace)]
    #[case("pet456\n", EntityIdValidationError::Whitespace)]
    fn rejects_invalid_ids(#[case] raw: &str, #[case] expected: EntityIdValidationError) {
        assert_eq!(EntityId::new(raw), Err(expected));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(EntityId::generate(), EntityId::generate());
    }

    #[test]
    fn deserialising_rejects_blank_ids() {
        let result: Result<EntityId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[rstest]
    #[case(EntityKind::User, "usercache:")]
    #[case(EntityKind::Pet, "petcache:")]
    #[case(EntityKind::Application, "adoptioncache:")]
    fn cache_prefixes_are_distinct(#[case] kind: EntityKind, #[case] prefix: &str) {
        assert_eq!(kind.cache_prefix(), prefix);
    }

    #[test]
    fn next_update_is_strictly_later_when_clock_stalls() {
        let previous = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid instant");
        let earlier = previous - TimeDelta::seconds(5);
        assert_eq!(
            next_update_instant(previous, earlier),
            previous + TimeDelta::microseconds(1)
        );
    }

    #[test]
    fn next_update_follows_clock_when_it_advances() {
        let previous = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid instant");
        let later = previous + TimeDelta::seconds(2);
        assert_eq!(next_update_instant(previous, later), later);
    }

    #[test]
    fn storage_instant_drops_nanoseconds() {
        let instant = Utc
            .timestamp_opt(1_700_000_000, 123_456_789)
            .single()
            .expect("valid instant");
        assert_eq!(storage_instant(instant).timestamp_subsec_nanos(), 123_456_000);
    }
}
