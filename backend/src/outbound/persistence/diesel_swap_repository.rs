//! PostgreSQL-backed `SwapRepository` implementation using Diesel ORM.
//!
//! Race-sensitive operations run inside a single transaction. Status
//! transitions are conditional updates on the stored status; completion
//! locks both the swap and its listing with `FOR UPDATE`, re-checks the
//! remaining volume, and writes both rows together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::pagination::PageRequest;
use crate::domain::ports::{
    SwapCompletion, SwapRepository, SwapRepositoryError, SwapTransition,
};
use crate::domain::swap::{Swap, SwapDraft, SwapRole, SwapStatus};
use crate::domain::user::UserId;

use super::diesel_listing_repository::row_to_listing;
use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ListingRow, NewSwapRow, SwapRow, SwapTransitionChangeset};
use super::pool::{DbPool, PoolError};
use super::schema::{listings, swaps};

/// Diesel-backed implementation of the `SwapRepository` port.
#[derive(Clone)]
pub struct DieselSwapRepository {
    pool: DbPool,
}

impl DieselSwapRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> SwapRepositoryError {
    map_pool_error(error, SwapRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> SwapRepositoryError {
    map_diesel_error(
        error,
        SwapRepositoryError::query,
        SwapRepositoryError::connection,
    )
}

/// Convert a database row to a domain swap. A stored row that fails domain
/// validation indicates corruption and maps to a query error.
fn row_to_swap(row: SwapRow) -> Result<Swap, SwapRepositoryError> {
    fn query_error(error: impl std::fmt::Display) -> SwapRepositoryError {
        SwapRepositoryError::query(error.to_string())
    }

    let status = row.status.parse().map_err(query_error)?;
    Swap::new(SwapDraft {
        id: row.id,
        listing_id: row.listing_id,
        initiator_id: UserId::from_uuid(row.initiator_id),
        recipient_id: UserId::from_uuid(row.recipient_id),
        proposed_volume: row.proposed_volume,
        proposed_price: row.proposed_price,
        message: row.message,
        status,
        proposed_at: row.proposed_at,
        responded_at: row.responded_at,
        completed_at: row.completed_at,
    })
    .map_err(query_error)
}

fn rows_to_swaps(rows: Vec<SwapRow>) -> Result<Vec<Swap>, SwapRepositoryError> {
    rows.into_iter().map(row_to_swap).collect()
}

/// Failures inside the insert transaction, widened from Diesel errors.
enum InsertTxError {
    Diesel(diesel::result::Error),
    Duplicate,
}

impl From<diesel::result::Error> for InsertTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

/// Failures inside the completion transaction, widened from Diesel errors.
enum CompleteTxError {
    Diesel(diesel::result::Error),
    SwapMissing,
    Stale(String),
    Insufficient { available: f64, requested: f64 },
    Corrupt(String),
}

impl From<diesel::result::Error> for CompleteTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn stale_status(stored: &str) -> SwapRepositoryError {
    match stored.parse() {
        Ok(current) => SwapRepositoryError::StaleStatus { current },
        Err(error) => SwapRepositoryError::query(format!("stored swap status unreadable: {error}")),
    }
}

#[async_trait]
impl SwapRepository for DieselSwapRepository {
    async fn insert_pending(&self, swap: &Swap) -> Result<(), SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewSwapRow {
            id: swap.id(),
            listing_id: swap.listing_id(),
            initiator_id: *swap.initiator_id().as_uuid(),
            recipient_id: *swap.recipient_id().as_uuid(),
            proposed_volume: swap.proposed_volume(),
            proposed_price: swap.proposed_price(),
            message: swap.message(),
            status: swap.status().as_str(),
            proposed_at: swap.proposed_at(),
        };

        let result: Result<(), InsertTxError> = conn
            .transaction(|conn| {
                async move {
                    let open_proposals: i64 = swaps::table
                        .filter(swaps::listing_id.eq(new_row.listing_id))
                        .filter(swaps::initiator_id.eq(new_row.initiator_id))
                        .filter(swaps::status.eq(SwapStatus::Pending.as_str()))
                        .count()
                        .get_result(conn)
                        .await?;
                    if open_proposals > 0 {
                        return Err(InsertTxError::Duplicate);
                    }

                    diesel::insert_into(swaps::table)
                        .values(&new_row)
                        .execute(conn)
                        .await?;
                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|error| match error {
            InsertTxError::Diesel(error) => map_diesel(error),
            InsertTxError::Duplicate => SwapRepositoryError::DuplicateProposal,
        })
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Swap>, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row: Option<SwapRow> = swaps::table
            .find(id)
            .select(SwapRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_swap).transpose()
    }

    async fn transition(
        &self,
        id: &Uuid,
        expected: &[SwapStatus],
        change: &SwapTransition,
    ) -> Result<Swap, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let expected_strs: Vec<&'static str> =
            expected.iter().map(|status| status.as_str()).collect();
        let changeset = SwapTransitionChangeset {
            status: change.status.as_str(),
            responded_at: change.responded_at,
            message: change.message.as_deref(),
        };

        let updated: Option<SwapRow> = diesel::update(
            swaps::table
                .find(id)
                .filter(swaps::status.eq_any(expected_strs)),
        )
        .set(&changeset)
        .returning(SwapRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel)?;

        match updated {
            Some(row) => row_to_swap(row),
            // The conditional update matched nothing: either the swap is
            // gone or another writer moved it first.
            None => {
                let stored: Option<String> = swaps::table
                    .find(id)
                    .select(swaps::status)
                    .first(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel)?;
                match stored {
                    Some(status) => Err(stale_status(&status)),
                    None => Err(SwapRepositoryError::query("swap not found for transition")),
                }
            }
        }
    }

    async fn complete(
        &self,
        id: &Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<SwapCompletion, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let swap_id = *id;

        let result: Result<(SwapRow, ListingRow), CompleteTxError> = conn
            .transaction(|conn| {
                async move {
                    let swap_row: SwapRow = swaps::table
                        .find(swap_id)
                        .for_update()
                        .select(SwapRow::as_select())
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or(CompleteTxError::SwapMissing)?;
                    if swap_row.status != SwapStatus::Accepted.as_str() {
                        return Err(CompleteTxError::Stale(swap_row.status));
                    }

                    let listing_row: ListingRow = listings::table
                        .find(swap_row.listing_id)
                        .for_update()
                        .select(ListingRow::as_select())
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| {
                            CompleteTxError::Corrupt("listing missing for swap".into())
                        })?;

                    let mut listing = row_to_listing(listing_row)
                        .map_err(|error| CompleteTxError::Corrupt(error.to_string()))?;
                    if swap_row.proposed_volume > listing.volume() {
                        return Err(CompleteTxError::Insufficient {
                            available: listing.volume(),
                            requested: swap_row.proposed_volume,
                        });
                    }
                    listing.apply_completed_volume(swap_row.proposed_volume);

                    let updated_swap: SwapRow = diesel::update(swaps::table.find(swap_id))
                        .set((
                            swaps::status.eq(SwapStatus::Completed.as_str()),
                            swaps::completed_at.eq(Some(completed_at)),
                        ))
                        .returning(SwapRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let updated_listing: ListingRow =
                        diesel::update(listings::table.find(listing.id()))
                            .set((
                                listings::volume.eq(listing.volume()),
                                listings::status.eq(listing.status().as_str()),
                            ))
                            .returning(ListingRow::as_returning())
                            .get_result(conn)
                            .await?;

                    Ok((updated_swap, updated_listing))
                }
                .scope_boxed()
            })
            .await;

        let (swap_row, listing_row) = result.map_err(|error| match error {
            CompleteTxError::Diesel(error) => map_diesel(error),
            CompleteTxError::SwapMissing => {
                SwapRepositoryError::query("swap not found for completion")
            }
            CompleteTxError::Stale(stored) => stale_status(&stored),
            CompleteTxError::Insufficient {
                available,
                requested,
            } => SwapRepositoryError::InsufficientVolume {
                available,
                requested,
            },
            CompleteTxError::Corrupt(message) => SwapRepositoryError::query(message),
        })?;

        Ok(SwapCompletion {
            swap: row_to_swap(swap_row)?,
            listing: row_to_listing(listing_row)
                .map_err(|error| SwapRepositoryError::query(error.to_string()))?,
        })
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        role: Option<SwapRole>,
        status: Option<SwapStatus>,
        page: &PageRequest,
    ) -> Result<Vec<Swap>, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let user_id = *user_id.as_uuid();

        let mut query = match role {
            None => swaps::table
                .filter(
                    swaps::initiator_id
                        .eq(user_id)
                        .or(swaps::recipient_id.eq(user_id)),
                )
                .into_boxed(),
            Some(SwapRole::Initiator) => {
                swaps::table.filter(swaps::initiator_id.eq(user_id)).into_boxed()
            }
            Some(SwapRole::Recipient) => {
                swaps::table.filter(swaps::recipient_id.eq(user_id)).into_boxed()
            }
        };
        if let Some(status) = status {
            query = query.filter(swaps::status.eq(status.as_str()));
        }

        let rows: Vec<SwapRow> = query
            .order(swaps::proposed_at.desc())
            .offset(page.offset())
            .limit(page.limit())
            .select(SwapRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows_to_swaps(rows)
    }

    async fn list_for_listing(&self, listing_id: &Uuid) -> Result<Vec<Swap>, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<SwapRow> = swaps::table
            .filter(swaps::listing_id.eq(listing_id))
            .order(swaps::proposed_at.desc())
            .select(SwapRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows_to_swaps(rows)
    }
}
