//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling.
//!
//! Adapters here are thin translators: they convert between Diesel row
//! structs and domain types and map database failures to port errors. Row
//! structs (`models.rs`) and table definitions (`schema.rs`) are internal
//! to this module and never reach the domain layer. Race-sensitive writes
//! (duplicate-proposal checks, conditional status transitions, completion
//! volume re-checks) run inside single transactions here rather than in
//! the services.

mod diesel_listing_repository;
mod diesel_swap_repository;
mod diesel_user_repository;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_listing_repository::DieselListingRepository;
pub use diesel_swap_repository::DieselSwapRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
