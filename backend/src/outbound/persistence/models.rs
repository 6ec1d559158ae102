//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{listings, swaps, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub email_verified: bool,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub email_verified: bool,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Listing models
// ---------------------------------------------------------------------------

/// Row struct for reading from the listings table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = listings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ListingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_type: String,
    pub energy_type: String,
    pub volume: f64,
    pub price: f64,
    pub location: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new listing records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = listings)]
pub(crate) struct NewListingRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_type: &'a str,
    pub energy_type: &'a str,
    pub volume: f64,
    pub price: f64,
    pub location: &'a str,
    pub description: Option<&'a str>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Changeset struct for overwriting an existing listing.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = listings)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ListingChangeset<'a> {
    pub listing_type: &'a str,
    pub energy_type: &'a str,
    pub volume: f64,
    pub price: f64,
    pub location: &'a str,
    pub description: Option<&'a str>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: &'a str,
}

// ---------------------------------------------------------------------------
// Swap models
// ---------------------------------------------------------------------------

/// Row struct for reading from the swaps table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = swaps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SwapRow {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub initiator_id: Uuid,
    pub recipient_id: Uuid,
    pub proposed_volume: f64,
    pub proposed_price: Option<f64>,
    pub message: Option<String>,
    pub status: String,
    pub proposed_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insertable struct for creating new swap records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = swaps)]
pub(crate) struct NewSwapRow<'a> {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub initiator_id: Uuid,
    pub recipient_id: Uuid,
    pub proposed_volume: f64,
    pub proposed_price: Option<f64>,
    pub message: Option<&'a str>,
    pub status: &'a str,
    pub proposed_at: DateTime<Utc>,
}

/// Changeset struct for a conditional status transition.
///
/// `None` fields are skipped by Diesel, which is exactly the "leave
/// untouched" semantics the port promises for `responded_at` and `message`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = swaps)]
pub(crate) struct SwapTransitionChangeset<'a> {
    pub status: &'a str,
    pub responded_at: Option<DateTime<Utc>>,
    pub message: Option<&'a str>,
}
