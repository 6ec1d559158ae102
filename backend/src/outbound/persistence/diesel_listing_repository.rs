//! PostgreSQL-backed `ListingRepository` implementation using Diesel ORM.
//!
//! Feed queries are built once as a boxed query and materialised twice: once
//! for the pre-pagination count and once for the requested page. Boxed
//! queries are not `Clone`, so the builder runs per materialisation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::listing::{
    Listing, ListingDraft, ListingStatus, TimeWindow,
};
use crate::domain::pagination::PageRequest;
use crate::domain::ports::{
    FeedFilter, ListingRepository, ListingRepositoryError, MatchQuery,
};
use crate::domain::user::UserId;

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ListingChangeset, ListingRow, NewListingRow};
use super::pool::{DbPool, PoolError};
use super::schema::listings;

/// Diesel-backed implementation of the `ListingRepository` port.
#[derive(Clone)]
pub struct DieselListingRepository {
    pool: DbPool,
}

impl DieselListingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> ListingRepositoryError {
    map_pool_error(error, ListingRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> ListingRepositoryError {
    map_diesel_error(
        error,
        ListingRepositoryError::query,
        ListingRepositoryError::connection,
    )
}

/// Convert a database row to a domain listing. A stored row that fails
/// domain validation indicates corruption and maps to a query error.
pub(crate) fn row_to_listing(row: ListingRow) -> Result<Listing, ListingRepositoryError> {
    fn query_error(error: impl std::fmt::Display) -> ListingRepositoryError {
        ListingRepositoryError::query(error.to_string())
    }

    let listing_type = row.listing_type.parse().map_err(query_error)?;
    let energy_type = row.energy_type.parse().map_err(query_error)?;
    let status = row.status.parse().map_err(query_error)?;
    let window = TimeWindow::new(row.start_time, row.end_time).map_err(query_error)?;

    Listing::new(ListingDraft {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        listing_type,
        energy_type,
        volume: row.volume,
        price: row.price,
        location: row.location,
        description: row.description,
        window,
        status,
        created_at: row.created_at,
    })
    .map_err(query_error)
}

fn rows_to_listings(rows: Vec<ListingRow>) -> Result<Vec<Listing>, ListingRepositoryError> {
    rows.into_iter().map(row_to_listing).collect()
}

/// Build the feed base query: active listings owned by someone else, with
/// the filter's optional narrowing applied.
fn feed_query<'a>(
    viewer: Uuid,
    filter: &FeedFilter,
) -> listings::BoxedQuery<'a, diesel::pg::Pg> {
    let mut query = listings::table
        .filter(listings::user_id.ne(viewer))
        .filter(listings::status.eq(ListingStatus::Active.as_str()))
        .into_boxed();

    if let Some(listing_type) = filter.listing_type {
        query = query.filter(listings::listing_type.eq(listing_type.as_str()));
    }
    if let Some(energy_type) = filter.energy_type {
        query = query.filter(listings::energy_type.eq(energy_type.as_str()));
    }
    if let Some(location) = &filter.location {
        query = query.filter(listings::location.ilike(format!("%{location}%")));
    }
    query
}

#[async_trait]
impl ListingRepository for DieselListingRepository {
    async fn insert(&self, listing: &Listing) -> Result<(), ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewListingRow {
            id: listing.id(),
            user_id: *listing.user_id().as_uuid(),
            listing_type: listing.listing_type().as_str(),
            energy_type: listing.energy_type().as_str(),
            volume: listing.volume(),
            price: listing.price(),
            location: listing.location(),
            description: listing.description(),
            start_time: listing.window().start(),
            end_time: listing.window().end(),
            status: listing.status().as_str(),
            created_at: listing.created_at(),
        };

        diesel::insert_into(listings::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Listing>, ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row: Option<ListingRow> = listings::table
            .find(id)
            .select(ListingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_listing).transpose()
    }

    async fn update(&self, listing: &Listing) -> Result<(), ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let changeset = ListingChangeset {
            listing_type: listing.listing_type().as_str(),
            energy_type: listing.energy_type().as_str(),
            volume: listing.volume(),
            price: listing.price(),
            location: listing.location(),
            description: listing.description(),
            start_time: listing.window().start(),
            end_time: listing.window().end(),
            status: listing.status().as_str(),
        };

        let updated = diesel::update(listings::table.find(listing.id()))
            .set(&changeset)
            .execute(&mut conn)
            .await
            .map_err(map_diesel)?;
        if updated == 0 {
            return Err(ListingRepositoryError::query("listing not found for update"));
        }
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        diesel::delete(listings::table.find(id))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        status: Option<ListingStatus>,
        page: &PageRequest,
    ) -> Result<Vec<Listing>, ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut query = listings::table
            .filter(listings::user_id.eq(user_id.as_uuid()))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(listings::status.eq(status.as_str()));
        }

        let rows: Vec<ListingRow> = query
            .order(listings::created_at.desc())
            .offset(page.offset())
            .limit(page.limit())
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows_to_listings(rows)
    }

    async fn feed(
        &self,
        viewer: &UserId,
        filter: &FeedFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Listing>, u64), ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let total: i64 = feed_query(*viewer.as_uuid(), filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;

        let rows: Vec<ListingRow> = feed_query(*viewer.as_uuid(), filter)
            .order(listings::created_at.desc())
            .offset(page.offset())
            .limit(page.limit())
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok((rows_to_listings(rows)?, u64::try_from(total).unwrap_or_default()))
    }

    async fn find_matches(
        &self,
        query: &MatchQuery,
    ) -> Result<Vec<Listing>, ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<ListingRow> = listings::table
            .filter(listings::user_id.ne(query.exclude_user.as_uuid()))
            .filter(listings::status.eq(ListingStatus::Active.as_str()))
            .filter(listings::listing_type.eq(query.listing_type.as_str()))
            .filter(listings::energy_type.eq(query.energy_type.as_str()))
            // Inclusive overlap: candidate.start <= seed.end AND
            // candidate.end >= seed.start.
            .filter(listings::start_time.le(query.window.end()))
            .filter(listings::end_time.ge(query.window.start()))
            .order(listings::created_at.desc())
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows_to_listings(rows)
    }
}
