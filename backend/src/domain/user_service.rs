//! User account service.

use serde_json::json;
use tracing::info;

use crate::domain::{
    CacheAsideRepository, EntityId, Error, ListQuery, NewUser, PageRequest, User, UserPatch,
};

/// User service backed by the cache-aside repository.
///
/// Email and username uniqueness is checked with a store lookup before each
/// write. Two concurrent registrations may still race past the check.
#[derive(Clone)]
pub struct UserService {
    repository: CacheAsideRepository<User>,
}

impl UserService {
    /// Create the service.
    pub fn new(repository: CacheAsideRepository<User>) -> Self {
        Self { repository }
    }

    /// Register a user with a unique email and username.
    pub async fn create_user(&self, draft: NewUser) -> Result<User, Error> {
        self.ensure_unique("email", draft.email.trim(), None).await?;
        self.ensure_unique("username", draft.username.trim(), None)
            .await?;
        let user = self.repository.create(draft).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Fetch one user.
    pub async fn get_user(&self, id: &EntityId) -> Result<User, Error> {
        self.repository.get(id).await
    }

    /// Apply a partial profile update.
    pub async fn update_user(&self, id: &EntityId, patch: UserPatch) -> Result<User, Error> {
        if let Some(username) = patch.username.as_deref() {
            self.ensure_unique("username", username.trim(), Some(id))
                .await?;
        }
        let user = self.repository.update(id, patch).await?;
        info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    /// Remove a user.
    pub async fn delete_user(&self, id: &EntityId) -> Result<(), Error> {
        self.repository.delete(id).await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn ensure_unique(
        &self,
        field: &str,
        value: &str,
        owner: Option<&EntityId>,
    ) -> Result<(), Error> {
        if value.is_empty() {
            return Ok(());
        }
        let query = ListQuery::new(PageRequest::clamped(Some(1), Some(1))).with_field(field, value);
        let existing = self.repository.list(&query).await?;
        let taken = existing
            .items
            .iter()
            .any(|user| owner.is_none_or(|owner| owner != &user.id));
        if taken {
            return Err(Error::conflict(format!("{field} is already registered"))
                .with_details(json!({ "field": field, "code": "already_exists" })));
        }
        Ok(())
    }
}
