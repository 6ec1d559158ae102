//! Port for persisting and looking up user accounts.

use async_trait::async_trait;

use crate::domain::user::{EmailAddress, User, UserId};

/// Errors surfaced by [`UserRepository`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserRepositoryError {
    /// A connection could not be obtained or was lost mid-operation.
    #[error("user store connection failed: {message}")]
    Connection { message: String },
    /// The store rejected or failed to execute the operation.
    #[error("user store query failed: {message}")]
    Query { message: String },
    /// Another account already holds the requested email address.
    #[error("email address is already registered")]
    DuplicateEmail,
}

impl UserRepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Store of registered user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new account. Fails with
    /// [`UserRepositoryError::DuplicateEmail`] when the address is taken.
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Look up an account by its unique email address.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Look up an account by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;
}
