//! Port for persisting and querying capacity listings.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::listing::{EnergyType, Listing, ListingStatus, ListingType, TimeWindow};
use crate::domain::pagination::PageRequest;
use crate::domain::user::UserId;

/// Errors surfaced by [`ListingRepository`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingRepositoryError {
    /// A connection could not be obtained or was lost mid-operation.
    #[error("listing store connection failed: {message}")]
    Connection { message: String },
    /// The store rejected or failed to execute the operation.
    #[error("listing store query failed: {message}")]
    Query { message: String },
}

impl ListingRepositoryError {
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

/// Optional narrowing applied to the marketplace feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedFilter {
    pub listing_type: Option<ListingType>,
    pub energy_type: Option<EnergyType>,
    /// Case-insensitive substring match on the listing location.
    pub location: Option<String>,
}

/// Criteria for finding counterparties to a seed listing.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    /// Owner of the seed listing; their own listings never match.
    pub exclude_user: UserId,
    /// Already the opposite of the seed's type.
    pub listing_type: ListingType,
    pub energy_type: EnergyType,
    /// The seed's delivery window; candidates must overlap it.
    pub window: TimeWindow,
}

/// Store of capacity listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Persist a new listing.
    async fn insert(&self, listing: &Listing) -> Result<(), ListingRepositoryError>;

    /// Look up a listing by identifier.
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Listing>, ListingRepositoryError>;

    /// Overwrite a listing's stored state with the supplied snapshot.
    async fn update(&self, listing: &Listing) -> Result<(), ListingRepositoryError>;

    /// Remove a listing; swaps referencing it are removed with it.
    async fn delete(&self, id: &Uuid) -> Result<(), ListingRepositoryError>;

    /// A user's own listings, newest first, optionally narrowed by status.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        status: Option<ListingStatus>,
        page: &PageRequest,
    ) -> Result<Vec<Listing>, ListingRepositoryError>;

    /// One page of active listings from other users, newest first, plus the
    /// total number of rows matching the filter before pagination.
    async fn feed(
        &self,
        viewer: &UserId,
        filter: &FeedFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Listing>, u64), ListingRepositoryError>;

    /// Active listings from other users that satisfy the match criteria,
    /// newest first.
    async fn find_matches(
        &self,
        query: &MatchQuery,
    ) -> Result<Vec<Listing>, ListingRepositoryError>;
}
