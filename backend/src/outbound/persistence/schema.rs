//! Diesel table definitions for the document store.
//!
//! Must match `migrations/` exactly.

diesel::table! {
    /// One row per stored entity, discriminated by kind.
    entity_documents (kind, id) {
        /// Entity kind discriminator.
        kind -> Text,
        /// Entity identifier, unique within its kind.
        id -> Text,
        /// Serialized entity.
        body -> Jsonb,
        /// Creation instant copied from the entity.
        created_at -> Timestamptz,
        /// Last modification instant copied from the entity.
        updated_at -> Timestamptz,
    }
}
