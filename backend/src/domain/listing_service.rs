//! Lifecycle of capacity listings: create, read, update, delete.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::error::Error;
use crate::domain::listing::{
    EnergyType, Listing, ListingDraft, ListingStatus, ListingType, TimeWindow,
};
use crate::domain::pagination::PageRequest;
use crate::domain::ports::{ListingRepository, ListingRepositoryError, UserRepository};
use crate::domain::user::UserId;

/// Input for publishing a new listing.
#[derive(Debug, Clone)]
pub struct NewListingRequest {
    pub listing_type: ListingType,
    pub energy_type: EnergyType,
    pub volume: f64,
    pub price: f64,
    pub location: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Partial update to a listing; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ListingUpdate {
    pub volume: Option<f64>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: Option<ListingStatus>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Listing CRUD over a [`ListingRepository`] and a [`UserRepository`].
pub struct ListingService<L, U> {
    listings: Arc<L>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<L: ListingRepository, U: UserRepository> ListingService<L, U> {
    pub fn new(listings: Arc<L>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            listings,
            users,
            clock,
        }
    }

    /// Publish a new active listing owned by `owner`.
    pub async fn create_listing(
        &self,
        owner: UserId,
        request: NewListingRequest,
    ) -> Result<Listing, Error> {
        self.users
            .find_by_id(&owner)
            .await
            .map_err(|error| {
                debug!(%error, "user repository operation failed");
                Error::infrastructure(error.to_string())
            })?
            .ok_or_else(|| Error::not_found("user not found"))?;

        let window = TimeWindow::new(request.start_time, request.end_time)
            .map_err(|error| Error::validation_failed(error.to_string()))?;
        let listing = Listing::new(ListingDraft {
            id: Uuid::new_v4(),
            user_id: owner,
            listing_type: request.listing_type,
            energy_type: request.energy_type,
            volume: request.volume,
            price: request.price,
            location: request.location,
            description: request.description,
            window,
            status: ListingStatus::Active,
            created_at: self.clock.utc(),
        })
        .map_err(|error| Error::validation_failed(error.to_string()))?;

        self.listings
            .insert(&listing)
            .await
            .map_err(map_listing_repo_error)?;
        Ok(listing)
    }

    /// Fetch a listing by identifier. Listings are publicly readable.
    pub async fn get_listing(&self, id: Uuid) -> Result<Listing, Error> {
        self.listings
            .find_by_id(&id)
            .await
            .map_err(map_listing_repo_error)?
            .ok_or_else(|| Error::not_found("listing not found"))
    }

    /// Apply a partial update. Only the owner may modify a listing; the
    /// merged delivery window is revalidated as a whole.
    pub async fn update_listing(
        &self,
        id: Uuid,
        caller: UserId,
        update: ListingUpdate,
    ) -> Result<Listing, Error> {
        let existing = self.get_listing(id).await?;
        if existing.user_id() != &caller {
            return Err(Error::forbidden("only the owner may modify a listing"));
        }

        let window = TimeWindow::new(
            update.start_time.unwrap_or_else(|| existing.window().start()),
            update.end_time.unwrap_or_else(|| existing.window().end()),
        )
        .map_err(|error| Error::validation_failed(error.to_string()))?;
        let updated = Listing::new(ListingDraft {
            id: existing.id(),
            user_id: *existing.user_id(),
            listing_type: existing.listing_type(),
            energy_type: existing.energy_type(),
            volume: update.volume.unwrap_or_else(|| existing.volume()),
            price: update.price.unwrap_or_else(|| existing.price()),
            location: update
                .location
                .unwrap_or_else(|| existing.location().to_owned()),
            description: update
                .description
                .or_else(|| existing.description().map(str::to_owned)),
            window,
            status: update.status.unwrap_or_else(|| existing.status()),
            created_at: existing.created_at(),
        })
        .map_err(|error| Error::validation_failed(error.to_string()))?;

        self.listings
            .update(&updated)
            .await
            .map_err(map_listing_repo_error)?;
        Ok(updated)
    }

    /// Remove a listing and every swap proposed against it. Owner only.
    pub async fn delete_listing(&self, id: Uuid, caller: UserId) -> Result<(), Error> {
        let existing = self.get_listing(id).await?;
        if existing.user_id() != &caller {
            return Err(Error::forbidden("only the owner may delete a listing"));
        }
        self.listings
            .delete(&id)
            .await
            .map_err(map_listing_repo_error)
    }

    /// A user's own listings, newest first.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        status: Option<ListingStatus>,
        page: &PageRequest,
    ) -> Result<Vec<Listing>, Error> {
        self.listings
            .list_for_user(&user_id, status, page)
            .await
            .map_err(map_listing_repo_error)
    }
}

pub(crate) fn map_listing_repo_error(error: ListingRepositoryError) -> Error {
    debug!(%error, "listing repository operation failed");
    Error::infrastructure(error.to_string())
}
