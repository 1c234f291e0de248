//! In-process `EntityStore` used for local runs and tests.
//!
//! Filters compare the JSON rendering of top-level fields, matching the
//! semantics of the Postgres adapter's `body ->> field` comparison.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{EntityStore, EntityStoreError};
use crate::domain::{Entity, EntityId, FieldFilter, ListQuery, Page};

/// Mutex-guarded map of entities keyed by id.
pub struct InMemoryEntityStore<E> {
    records: Mutex<HashMap<EntityId, E>>,
}

impl<E> Default for InMemoryEntityStore<E> {
    fn default() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<E: Entity> InMemoryEntityStore<E> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<EntityId, E>>, EntityStoreError> {
        self.records
            .lock()
            .map_err(|_| EntityStoreError::query("in-memory store lock poisoned"))
    }

    fn matches(entity: &E, filter: &FieldFilter) -> Result<bool, EntityStoreError> {
        if filter.is_empty() {
            return Ok(true);
        }
        let document = serde_json::to_value(entity)
            .map_err(|err| EntityStoreError::serialization(err.to_string()))?;
        Ok(filter.iter().all(|(field, expected)| {
            document
                .get(field)
                .and_then(json_text)
                .is_some_and(|actual| actual == *expected)
        }))
    }
}

fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for InMemoryEntityStore<E> {
    async fn create(&self, entity: &E) -> Result<(), EntityStoreError> {
        let mut records = self.lock()?;
        if records.contains_key(entity.id()) {
            return Err(EntityStoreError::duplicate(entity.id().as_str()));
        }
        records.insert(entity.id().clone(), entity.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &EntityId) -> Result<Option<E>, EntityStoreError> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn update(&self, entity: &E) -> Result<(), EntityStoreError> {
        let mut records = self.lock()?;
        match records.get_mut(entity.id()) {
            Some(existing) => {
                *existing = entity.clone();
                Ok(())
            }
            None => Err(EntityStoreError::not_found(entity.id().as_str())),
        }
    }

    async fn delete(&self, id: &EntityId) -> Result<(), EntityStoreError> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EntityStoreError::not_found(id.as_str()))
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<E>, EntityStoreError> {
        let records = self.lock()?;
        let mut matched = Vec::new();
        for entity in records.values() {
            if Self::matches(entity, &query.filter)? {
                matched.push(entity.clone());
            }
        }
        drop(records);

        matched.sort_by(|left, right| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| right.id().cmp(left.id()))
        });
        let total = u64::try_from(matched.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.page.limit()).unwrap_or(usize::MAX);
        let items = matched.into_iter().skip(offset).take(limit).collect();
        Ok(Page::new(items, total, query.page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Application, ApplicationStatus, NewApplication, PageRequest};
    use chrono::{TimeDelta, TimeZone, Utc};
    use rstest::rstest;

    fn application(applicant: &str, offset_minutes: i64) -> Application {
        let at = Utc
            .with_ymd_and_hms(2026, 4, 1, 8, 0, 0)
            .single()
            .expect("valid instant")
            + TimeDelta::minutes(offset_minutes);
        Application::from_draft(
            EntityId::generate(),
            NewApplication {
                applicant_id: applicant.to_owned(),
                subject_id: "pet456".to_owned(),
                application_notes: None,
            },
            at,
        )
        .expect("valid draft")
    }

    #[tokio::test]
    async fn create_rejects_duplicate_ids() {
        let store = InMemoryEntityStore::new();
        let app = application("user123", 0);
        store.create(&app).await.expect("first insert");
        let error = store.create(&app).await.expect_err("duplicate");
        assert_eq!(error, EntityStoreError::duplicate(app.id.as_str()));
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let store = InMemoryEntityStore::<Application>::new();
        let app = application("user123", 0);
        assert!(matches!(
            store.update(&app).await,
            Err(EntityStoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(&app.id).await,
            Err(EntityStoreError::NotFound { .. })
        ));
    }

    #[rstest]
    #[case(1, 2, 2)]
    #[case(2, 2, 1)]
    #[case(3, 2, 0)]
    #[tokio::test]
    async fn list_filters_sorts_and_pages(
        #[case] page: i64,
        #[case] limit: i64,
        #[case] expected_len: usize,
    ) {
        let store = InMemoryEntityStore::new();
        for minutes in 0..3 {
            store
                .create(&application("user123", minutes))
                .await
                .expect("insert");
        }
        store
            .create(&application("someone-else", 10))
            .await
            .expect("insert");

        let query = ListQuery::new(PageRequest::clamped(Some(page), Some(limit)))
            .with_field("user_id", "user123");
        let result = store.list(&query).await.expect("list");

        assert_eq!(result.total, 3);
        assert_eq!(result.items.len(), expected_len);
        assert!(result
            .items
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn list_matches_enum_fields_by_wire_name() {
        let store = InMemoryEntityStore::new();
        let mut approved = application("user123", 0);
        approved.status = ApplicationStatus::Approved;
        store.create(&approved).await.expect("insert");
        store
            .create(&application("user123", 1))
            .await
            .expect("insert");

        let query = ListQuery::default().with_field("status", "APPROVED");
        let result = store.list(&query).await.expect("list");
        assert_eq!(result.items, vec![approved]);
    }
}
