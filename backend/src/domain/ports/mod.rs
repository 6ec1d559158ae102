//! Outbound ports required by the domain services.
//!
//! Each port is an async trait implemented by an adapter in
//! [`crate::outbound`]; tests substitute mockall-generated doubles.

mod listing_repository;
mod swap_repository;
mod user_repository;

pub use listing_repository::{
    FeedFilter, ListingRepository, ListingRepositoryError, MatchQuery,
};
pub use swap_repository::{
    SwapCompletion, SwapRepository, SwapRepositoryError, SwapTransition,
};
pub use user_repository::{UserRepository, UserRepositoryError};

#[cfg(test)]
pub use listing_repository::MockListingRepository;
#[cfg(test)]
pub use swap_repository::MockSwapRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
