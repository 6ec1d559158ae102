//! Domain model and services for the capacity marketplace.
//!
//! The domain layer owns the entities, the state machines, and the service
//! logic, and talks to the outside world only through the traits in
//! [`ports`]. Adapters live under [`crate::outbound`].

pub mod auth_service;
pub mod error;
pub mod listing;
pub mod listing_service;
pub mod matching;
pub mod pagination;
pub mod password;
pub mod ports;
pub mod swap;
pub mod swap_service;
pub mod tokens;
pub mod user;

pub use auth_service::{AuthService, NewUserRequest, Principal};
pub use error::{Error, ErrorCode};
pub use listing::{
    EnergyType, Listing, ListingDraft, ListingStatus, ListingType, TimeWindow,
};
pub use listing_service::{ListingService, ListingUpdate, NewListingRequest};
pub use matching::{FeedPage, MatchingService};
pub use pagination::{PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use password::{HasherParams, PasswordHasher};
pub use swap::{Swap, SwapDecision, SwapDraft, SwapRole, SwapStatus};
pub use swap_service::{ProposeSwapRequest, SwapService};
pub use tokens::{TokenConfig, TokenIssuer, TokenKind, TokenPair};
pub use user::{EmailAddress, User, UserDraft, UserId};
