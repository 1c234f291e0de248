//! Diesel and pool error mapping for the document store.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::EntityStoreError;

use super::pool::PoolError;

/// Map a pool failure to a connection error.
pub(super) fn map_pool_error(error: PoolError) -> EntityStoreError {
    EntityStoreError::connection(error.into_message())
}

/// Map a Diesel failure, reporting unique violations as duplicates of `id`.
pub(super) fn map_diesel_error(error: DieselError, id: &str) -> EntityStoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            EntityStoreError::duplicate(id)
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            EntityStoreError::connection("database connection closed")
        }
        DieselError::NotFound => EntityStoreError::not_found(id),
        DieselError::SerializationError(err) | DieselError::DeserializationError(err) => {
            EntityStoreError::serialization(err.to_string())
        }
        _ => EntityStoreError::query("database error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_the_id() {
        assert_eq!(
            map_diesel_error(DieselError::NotFound, "app789"),
            EntityStoreError::not_found("app789")
        );
    }

    #[test]
    fn pool_failures_are_connection_errors() {
        assert_eq!(
            map_pool_error(PoolError::checkout("timed out")),
            EntityStoreError::connection("timed out")
        );
    }

    #[test]
    fn rollback_is_a_query_error() {
        assert_eq!(
            map_diesel_error(DieselError::RollbackTransaction, "app789"),
            EntityStoreError::query("database error")
        );
    }
}
