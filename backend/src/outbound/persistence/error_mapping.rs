//! Shared Diesel error mapping for repositories with plain query semantics.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel errors into query/connection constructors, keeping the server
/// message so failures stay diagnosable from the repository error alone.
///
/// Repositories with richer semantics (unique-violation handling,
/// in-transaction re-checks) match on the error themselves before falling
/// back to this.
pub(crate) fn map_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(String) -> E,
    C: Fn(String) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            debug!(message = info.message(), "database connection lost");
            connection(format!("connection closed: {}", info.message()))
        }
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "database operation failed");
            query(format!("database error: {}", info.message()))
        }
        other => {
            debug!(error = %other, "query failed");
            query(format!("query failed: {other}"))
        }
    }
}
