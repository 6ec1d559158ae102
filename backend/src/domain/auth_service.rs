//! Account registration, credential checks, and token lifecycle.

use std::sync::Arc;

use mockable::Clock;
use tracing::debug;

use crate::domain::error::Error;
use crate::domain::password::PasswordHasher;
use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::tokens::{TokenError, TokenIssuer, TokenKind, TokenPair};
use crate::domain::user::{EmailAddress, User, UserDraft, UserId};

/// Input for registering a new account.
#[derive(Debug, Clone)]
pub struct NewUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// The authenticated caller derived from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub email: EmailAddress,
    pub email_verified: bool,
}

/// Registration, login, and token refresh over a [`UserRepository`].
pub struct AuthService<U> {
    users: Arc<U>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(
        users: Arc<U>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
        }
    }

    /// Register a new account and return its identifier.
    ///
    /// The password is hashed before anything touches the store; the
    /// plaintext is never persisted. A taken email address surfaces as a
    /// conflict.
    pub async fn create_user(&self, request: NewUserRequest) -> Result<UserId, Error> {
        let email = EmailAddress::new(request.email)
            .map_err(|error| Error::validation_failed(error.to_string()))?;
        if request.password.trim().is_empty() {
            return Err(Error::validation_failed("password must not be blank"));
        }

        let password_hash = self.hasher.hash(&request.password).map_err(|error| {
            debug!(%error, "password hashing failed");
            Error::infrastructure("password hashing failed")
        })?;

        let user = User::new(UserDraft {
            id: UserId::random(),
            email,
            email_verified: false,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
            created_at: self.clock.utc(),
        })
        .map_err(|error| Error::validation_failed(error.to_string()))?;

        match self.users.insert(&user).await {
            Ok(()) => Ok(*user.id()),
            Err(UserRepositoryError::DuplicateEmail) => {
                Err(Error::conflict("email address is already registered"))
            }
            Err(error) => Err(map_user_repo_error(error)),
        }
    }

    /// Verify credentials and mint a fresh token pair.
    ///
    /// An unknown address and a wrong password both authenticate-fail, with
    /// messages that distinguish the two for the caller's logs.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<TokenPair, Error> {
        let email = EmailAddress::new(email)
            .map_err(|_| Error::auth_failed("unknown email address"))?;
        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| Error::auth_failed("unknown email address"))?;

        if !self.hasher.verify(password, user.password_hash()) {
            return Err(Error::auth_failed("incorrect password"));
        }

        self.issue_pair(*user.id())
    }

    /// Exchange a valid refresh token for a fresh token pair.
    ///
    /// Rotation is stateless: the presented token is not invalidated and
    /// remains usable until its natural expiry.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, Error> {
        let user_id = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(map_token_error)?;
        self.issue_pair(user_id)
    }

    /// Resolve a verified access token to the account behind it.
    ///
    /// A token whose subject no longer exists authenticate-fails rather
    /// than erroring, so deleted accounts cannot keep acting.
    pub async fn current_principal(&self, access_token: &str) -> Result<Principal, Error> {
        let user_id = self
            .tokens
            .verify(access_token, TokenKind::Access)
            .map_err(map_token_error)?;
        let user = self
            .users
            .find_by_id(&user_id)
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| Error::auth_failed("account no longer exists"))?;

        Ok(Principal {
            user_id: *user.id(),
            email: user.email().clone(),
            email_verified: user.email_verified(),
        })
    }

    fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, Error> {
        self.tokens
            .issue_pair(user_id, self.clock.utc())
            .map_err(map_token_error)
    }
}

fn map_user_repo_error(error: UserRepositoryError) -> Error {
    debug!(%error, "user repository operation failed");
    Error::infrastructure(error.to_string())
}

fn map_token_error(error: TokenError) -> Error {
    match error {
        TokenError::Expired { .. } | TokenError::Invalid { .. } => {
            Error::auth_failed(error.to_string())
        }
        TokenError::Signing { .. } => {
            debug!(%error, "token signing failed");
            Error::infrastructure(error.to_string())
        }
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
