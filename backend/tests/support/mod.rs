//! Shared helpers for the persistence integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! helpers needed by more than one suite live here instead of being
//! copy/pasted.

pub mod cluster_skip;
pub mod embedded_postgres;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{create_schema, reset_database};

/// Render a `postgres` error with enough detail to act on.
///
/// The `Display` implementation on `postgres::Error` often collapses server
/// errors to a bare `db error`; `as_db_error()` exposes the message,
/// SQLSTATE, and hints when the server provided them.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );

    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }

    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }

    summary
}
