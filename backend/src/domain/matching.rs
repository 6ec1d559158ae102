//! Counterparty matching and the public marketplace feed.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::error::Error;
use crate::domain::listing::Listing;
use crate::domain::listing_service::map_listing_repo_error;
use crate::domain::pagination::PageRequest;
use crate::domain::ports::{FeedFilter, ListingRepository, MatchQuery};
use crate::domain::user::UserId;

/// One page of the marketplace feed, with the pre-pagination total.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub listings: Vec<Listing>,
    /// Rows matching the filter before pagination was applied.
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Read-side queries over the listing book.
pub struct MatchingService<L> {
    listings: Arc<L>,
}

impl<L: ListingRepository> MatchingService<L> {
    pub fn new(listings: Arc<L>) -> Self {
        Self { listings }
    }

    /// Counterparty candidates for a seed listing: active listings of the
    /// opposite type, same energy type, owned by someone else, whose
    /// delivery window overlaps the seed's (bounds inclusive).
    pub async fn find_matches(&self, listing_id: Uuid) -> Result<Vec<Listing>, Error> {
        let seed = self
            .listings
            .find_by_id(&listing_id)
            .await
            .map_err(map_listing_repo_error)?
            .ok_or_else(|| Error::not_found("listing not found"))?;

        let query = MatchQuery {
            exclude_user: *seed.user_id(),
            listing_type: seed.listing_type().opposite(),
            energy_type: seed.energy_type(),
            window: *seed.window(),
        };
        self.listings
            .find_matches(&query)
            .await
            .map_err(map_listing_repo_error)
    }

    /// One page of active listings from other users, newest first.
    pub async fn feed(
        &self,
        viewer: UserId,
        filter: FeedFilter,
        page: PageRequest,
    ) -> Result<FeedPage, Error> {
        let (listings, total) = self
            .listings
            .feed(&viewer, &filter, &page)
            .await
            .map_err(map_listing_repo_error)?;
        Ok(FeedPage {
            listings,
            total,
            page: page.page(),
            page_size: page.page_size(),
        })
    }
}
