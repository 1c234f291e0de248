//! Pet listing service.

use tracing::info;

use crate::domain::{
    CacheAsideRepository, EntityId, Error, ListQuery, NewPet, Page, PageRequest, Pet,
    PetAdoptionStatus, PetPatch,
};

/// Equality filters accepted by [`PetService::list_pets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetFilter {
    /// Match on species.
    pub species: Option<String>,
    /// Match on adoption status.
    pub adoption_status: Option<PetAdoptionStatus>,
    /// Match on the listing user.
    pub listed_by_user_id: Option<EntityId>,
}

impl PetFilter {
    fn apply(self, mut query: ListQuery) -> ListQuery {
        if let Some(species) = self.species.filter(|value| !value.trim().is_empty()) {
            query = query.with_field("species", species.trim());
        }
        if let Some(status) = self.adoption_status {
            query = query.with_field("adoption_status", status.as_str());
        }
        if let Some(owner) = self.listed_by_user_id {
            query = query.with_field("listed_by_user_id", owner);
        }
        query
    }
}

/// Pet service backed by the cache-aside repository.
#[derive(Clone)]
pub struct PetService {
    repository: CacheAsideRepository<Pet>,
}

impl PetService {
    /// Create the service.
    pub fn new(repository: CacheAsideRepository<Pet>) -> Self {
        Self { repository }
    }

    /// List a new pet as `AVAILABLE`.
    pub async fn create_pet(&self, draft: NewPet) -> Result<Pet, Error> {
        let pet = self.repository.create(draft).await?;
        info!(pet_id = %pet.id, species = %pet.species, "pet listed");
        Ok(pet)
    }

    /// Fetch one pet.
    pub async fn get_pet(&self, id: &EntityId) -> Result<Pet, Error> {
        self.repository.get(id).await
    }

    /// Apply a partial update.
    pub async fn update_pet(&self, id: &EntityId, patch: PetPatch) -> Result<Pet, Error> {
        let pet = self.repository.update(id, patch).await?;
        info!(pet_id = %pet.id, "pet updated");
        Ok(pet)
    }

    /// Remove a listing.
    pub async fn delete_pet(&self, id: &EntityId) -> Result<(), Error> {
        self.repository.delete(id).await?;
        info!(pet_id = %id, "pet deleted");
        Ok(())
    }

    /// Page through listings, newest first.
    pub async fn list_pets(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
        filter: PetFilter,
    ) -> Result<Page<Pet>, Error> {
        let query = filter.apply(ListQuery::new(PageRequest::clamped(page, limit)));
        self.repository.list(&query).await
    }

    /// Move a pet through the adoption process.
    ///
    /// `ADOPTED` requires `adopter`; other statuses clear any adopter.
    pub async fn update_adoption_status(
        &self,
        id: &EntityId,
        status: PetAdoptionStatus,
        adopter: Option<EntityId>,
    ) -> Result<Pet, Error> {
        let pet = self
            .repository
            .update(id, PetPatch::adoption(status, adopter))
            .await?;
        info!(pet_id = %pet.id, status = %pet.adoption_status, "pet adoption status updated");
        Ok(pet)
    }
}
