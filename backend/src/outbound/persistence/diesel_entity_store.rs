//! PostgreSQL-backed `EntityStore` implementation using Diesel ORM.
//!
//! Every entity kind shares the `entity_documents` table. Rows are keyed by
//! `(kind, id)` and carry the serialized entity as JSONB, so one generic
//! adapter serves users, pets and applications alike.

use std::marker::PhantomData;

use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{EntityStore, EntityStoreError};
use crate::domain::{Entity, EntityId, ListQuery, Page};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{DocumentRow, DocumentUpdate, NewDocumentRow};
use super::pool::DbPool;
use super::schema::entity_documents;

/// Diesel-backed document store for one entity kind.
pub struct DieselEntityStore<E> {
    pool: DbPool,
    kind: PhantomData<fn() -> E>,
}

impl<E> Clone for DieselEntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            kind: PhantomData,
        }
    }
}

impl<E: Entity> DieselEntityStore<E> {
    /// Create a store over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            kind: PhantomData,
        }
    }

    fn encode(entity: &E) -> Result<serde_json::Value, EntityStoreError> {
        serde_json::to_value(entity).map_err(|err| EntityStoreError::serialization(err.to_string()))
    }

    fn decode(row: DocumentRow) -> Result<E, EntityStoreError> {
        serde_json::from_value(row.body)
            .map_err(|err| EntityStoreError::serialization(err.to_string()))
    }

    /// Rows of this kind matching every equality constraint.
    ///
    /// Fields are compared as text via `body ->> field`, so numbers and enum
    /// names match their JSON rendering.
    fn filtered(query: &ListQuery) -> entity_documents::BoxedQuery<'static, Pg> {
        let mut statement = entity_documents::table
            .filter(entity_documents::kind.eq(E::KIND.as_str()))
            .into_boxed();
        for (field, value) in &query.filter {
            statement = statement.filter(
                sql::<Bool>("body ->> ")
                    .bind::<Text, _>(field.clone())
                    .sql(" = ")
                    .bind::<Text, _>(value.clone()),
            );
        }
        statement
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for DieselEntityStore<E> {
    async fn create(&self, entity: &E) -> Result<(), EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewDocumentRow {
            kind: E::KIND.as_str(),
            id: entity.id().as_str(),
            body: Self::encode(entity)?,
            created_at: entity.created_at(),
            updated_at: entity.updated_at(),
        };

        diesel::insert_into(entity_documents::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(err, entity.id().as_str()))
    }

    async fn get_by_id(&self, id: &EntityId) -> Result<Option<E>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DocumentRow> = entity_documents::table
            .filter(entity_documents::kind.eq(E::KIND.as_str()))
            .filter(entity_documents::id.eq(id.as_str()))
            .select(DocumentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, id.as_str()))?;

        row.map(Self::decode).transpose()
    }

    async fn update(&self, entity: &E) -> Result<(), EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = DocumentUpdate {
            body: Self::encode(entity)?,
            updated_at: entity.updated_at(),
        };

        let matched = diesel::update(entity_documents::table)
            .filter(entity_documents::kind.eq(E::KIND.as_str()))
            .filter(entity_documents::id.eq(entity.id().as_str()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, entity.id().as_str()))?;

        if matched == 0 {
            return Err(EntityStoreError::not_found(entity.id().as_str()));
        }
        Ok(())
    }

    async fn delete(&self, id: &EntityId) -> Result<(), EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(entity_documents::table)
            .filter(entity_documents::kind.eq(E::KIND.as_str()))
            .filter(entity_documents::id.eq(id.as_str()))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, id.as_str()))?;

        if deleted == 0 {
            return Err(EntityStoreError::not_found(id.as_str()));
        }
        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<E>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let scope = E::KIND.as_str();

        let total: i64 = Self::filtered(query)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, scope))?;

        let offset = i64::try_from(query.page.offset()).unwrap_or(i64::MAX);
        let rows: Vec<DocumentRow> = Self::filtered(query)
            .select(DocumentRow::as_select())
            .order((
                entity_documents::created_at.desc(),
                entity_documents::id.desc(),
            ))
            .offset(offset)
            .limit(i64::from(query.page.limit()))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, scope))?;

        let items = rows
            .into_iter()
            .map(Self::decode)
            .collect::<Result<Vec<_>, _>>()?;
        let total = u64::try_from(total).unwrap_or_default();
        Ok(Page::new(items, total, query.page))
    }
}
