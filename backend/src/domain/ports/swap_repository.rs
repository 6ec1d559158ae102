//! Port for persisting swap proposals and driving their transitions.
//!
//! Transitions that race with concurrent writers are guarded inside the
//! adapter: status changes are conditional on the stored status, and
//! completion re-checks the listing's remaining volume in the same
//! transaction that decrements it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::listing::Listing;
use crate::domain::pagination::PageRequest;
use crate::domain::swap::{Swap, SwapRole, SwapStatus};
use crate::domain::user::UserId;

/// Errors surfaced by [`SwapRepository`] implementations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwapRepositoryError {
    /// A connection could not be obtained or was lost mid-operation.
    #[error("swap store connection failed: {message}")]
    Connection { message: String },
    /// The store rejected or failed to execute the operation.
    #[error("swap store query failed: {message}")]
    Query { message: String },
    /// The initiator already has a pending proposal against this listing.
    #[error("a pending proposal for this listing already exists")]
    DuplicateProposal,
    /// The stored status no longer permits the requested transition.
    #[error("swap is already {current}")]
    StaleStatus { current: SwapStatus },
    /// The listing's remaining volume no longer covers the proposal.
    #[error("proposed volume ({requested}) exceeds available volume ({available})")]
    InsufficientVolume { available: f64, requested: f64 },
}

impl SwapRepositoryError {
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

/// The write applied by a conditional status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapTransition {
    pub status: SwapStatus,
    /// `Some` stamps the response time; `None` leaves it untouched.
    pub responded_at: Option<DateTime<Utc>>,
    /// `Some` replaces the stored message thread; `None` leaves it
    /// untouched.
    pub message: Option<String>,
}

/// Result of a successful completion: both rows as committed.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapCompletion {
    pub swap: Swap,
    pub listing: Listing,
}

/// Store of swap proposals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapRepository: Send + Sync {
    /// Persist a new pending proposal. Fails with
    /// [`SwapRepositoryError::DuplicateProposal`] when the initiator
    /// already has a pending swap against the same listing.
    async fn insert_pending(&self, swap: &Swap) -> Result<(), SwapRepositoryError>;

    /// Look up a swap by identifier.
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Swap>, SwapRepositoryError>;

    /// Atomically apply `change` if the stored status is one of `expected`,
    /// returning the updated swap. Fails with
    /// [`SwapRepositoryError::StaleStatus`] otherwise.
    async fn transition(
        &self,
        id: &Uuid,
        expected: &[SwapStatus],
        change: &SwapTransition,
    ) -> Result<Swap, SwapRepositoryError>;

    /// Atomically complete an accepted swap: mark it completed, stamp
    /// `completed_at`, and decrement the listing's volume, all in one
    /// transaction. Fails with [`SwapRepositoryError::StaleStatus`] when the
    /// swap is no longer accepted and
    /// [`SwapRepositoryError::InsufficientVolume`] when the listing can no
    /// longer cover the proposal.
    async fn complete(
        &self,
        id: &Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<SwapCompletion, SwapRepositoryError>;

    /// Swaps the user participates in, newest first, optionally narrowed by
    /// role and status.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        role: Option<SwapRole>,
        status: Option<SwapStatus>,
        page: &PageRequest,
    ) -> Result<Vec<Swap>, SwapRepositoryError>;

    /// All swaps proposed against a listing, newest first.
    async fn list_for_listing(&self, listing_id: &Uuid) -> Result<Vec<Swap>, SwapRepositoryError>;
}
