//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly; Diesel uses
//! them for compile-time query validation and type-safe SQL generation.

diesel::table! {
    /// Registered trader accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique login address (max 320 characters).
        email -> Varchar,
        /// Whether the address has been confirmed.
        email_verified -> Bool,
        first_name -> Varchar,
        last_name -> Varchar,
        /// Argon2id digest in PHC string format.
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Published capacity listings, both supply and demand.
    listings (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning trader.
        user_id -> Uuid,
        /// `supply` or `demand`.
        listing_type -> Varchar,
        /// `solar` or `wind`.
        energy_type -> Varchar,
        /// Remaining tradable volume in kWh.
        volume -> Float8,
        /// Asking price per kWh.
        price -> Float8,
        location -> Varchar,
        description -> Nullable<Varchar>,
        /// Delivery window start.
        start_time -> Timestamptz,
        /// Delivery window end; always after `start_time`.
        end_time -> Timestamptz,
        /// `active`, `inactive`, `completed`, or `cancelled`.
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Swap proposals negotiated against listings.
    swaps (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The listing this proposal targets; rows cascade on delete.
        listing_id -> Uuid,
        /// The proposing trader.
        initiator_id -> Uuid,
        /// The listing owner at proposal time.
        recipient_id -> Uuid,
        /// Volume the initiator wants, in kWh.
        proposed_volume -> Float8,
        /// Optional counter-price per kWh.
        proposed_price -> Nullable<Float8>,
        /// Accumulated message thread.
        message -> Nullable<Text>,
        /// `pending`, `accepted`, `rejected`, `completed`, or `cancelled`.
        status -> Varchar,
        proposed_at -> Timestamptz,
        responded_at -> Nullable<Timestamptz>,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(listings -> users (user_id));
diesel::joinable!(swaps -> listings (listing_id));

diesel::allow_tables_to_appear_in_same_query!(users, listings, swaps);
