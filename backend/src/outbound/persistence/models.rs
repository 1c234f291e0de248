//! Internal Diesel row structs for the document store.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::entity_documents;

/// Row read back from `entity_documents`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = entity_documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DocumentRow {
    pub body: serde_json::Value,
}

/// Insertable row for a new entity.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = entity_documents)]
pub(crate) struct NewDocumentRow<'a> {
    pub kind: &'a str,
    pub id: &'a str,
    pub body: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset replacing the body of an existing entity.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = entity_documents)]
pub(crate) struct DocumentUpdate {
    pub body: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
