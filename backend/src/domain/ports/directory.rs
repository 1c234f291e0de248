//! Port abstractions for the user and pet lookups used during enrichment.
//!
//! Both lookups are unary calls to other services. A missing record is a
//! distinct [`DirectoryError::NotFound`] so callers can tell it apart from
//! transport failures.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::EntityId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by directory clients.
    pub enum DirectoryError {
        /// The remote service has no record with this id.
        NotFound { id: String } => "no record found for id {id}",
        /// The call did not complete within its deadline.
        Timeout { message: String } => "directory call timed out: {message}",
        /// The remote service could not be reached or failed.
        Unavailable { message: String } => "directory service unavailable: {message}",
        /// The remote service answered with an unexpected payload.
        Protocol { message: String } => "unexpected directory response: {message}",
    }
}

/// Contact details returned by `GetUser`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserContact {
    /// User identifier.
    pub id: EntityId,
    /// Delivery address; may be empty when the profile is incomplete.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Listing summary returned by `GetPet`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PetSummary {
    /// Pet identifier.
    pub id: EntityId,
    /// Display name; may be empty when the listing is incomplete.
    #[serde(default)]
    pub name: String,
}

/// Remote lookup of users by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch contact details for `id`.
    async fn get_user(&self, id: &EntityId) -> Result<UserContact, DirectoryError>;
}

/// Remote lookup of pets by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PetDirectory: Send + Sync {
    /// Fetch the listing summary for `id`.
    async fn get_pet(&self, id: &EntityId) -> Result<PetSummary, DirectoryError>;
}
