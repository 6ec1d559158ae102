//! The swap negotiation state machine: propose, respond, cancel, complete.
//!
//! User-facing guard checks (existence, authorization, current status) run
//! here; race-sensitive re-checks run inside the repository's transactions
//! and surface as conflict-style port errors that are mapped back to the
//! caller-facing taxonomy.

use std::sync::Arc;

use mockable::Clock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::error::Error;
use crate::domain::listing::ListingStatus;
use crate::domain::pagination::PageRequest;
use crate::domain::ports::{
    ListingRepository, SwapRepository, SwapRepositoryError, SwapTransition,
};
use crate::domain::swap::{Swap, SwapDecision, SwapDraft, SwapRole, SwapStatus};
use crate::domain::user::UserId;

use crate::domain::listing_service::map_listing_repo_error;

/// Input for proposing a swap against a listing.
#[derive(Debug, Clone)]
pub struct ProposeSwapRequest {
    pub listing_id: Uuid,
    pub proposed_volume: f64,
    pub proposed_price: Option<f64>,
    pub message: Option<String>,
}

/// Swap negotiation over a [`SwapRepository`] and a [`ListingRepository`].
pub struct SwapService<S, L> {
    swaps: Arc<S>,
    listings: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<S: SwapRepository, L: ListingRepository> SwapService<S, L> {
    pub fn new(swaps: Arc<S>, listings: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self {
            swaps,
            listings,
            clock,
        }
    }

    /// Propose a pending swap against an active listing owned by someone
    /// else. The proposed volume must fit within the listing's remaining
    /// volume at proposal time; completion re-checks it again.
    pub async fn propose(
        &self,
        initiator: UserId,
        request: ProposeSwapRequest,
    ) -> Result<Swap, Error> {
        let listing = self
            .listings
            .find_by_id(&request.listing_id)
            .await
            .map_err(map_listing_repo_error)?
            .ok_or_else(|| Error::not_found("listing not found"))?;

        if listing.status() != ListingStatus::Active {
            return Err(Error::invalid_transition(format!(
                "cannot propose a swap against a listing that is {}",
                listing.status()
            )));
        }
        if listing.user_id() == &initiator {
            return Err(Error::validation_failed(
                "cannot propose a swap against your own listing",
            ));
        }
        if request.proposed_volume > listing.volume() {
            return Err(Error::validation_failed(format!(
                "proposed volume ({}) exceeds available volume ({})",
                request.proposed_volume,
                listing.volume()
            )));
        }

        let swap = Swap::new(SwapDraft {
            id: Uuid::new_v4(),
            listing_id: listing.id(),
            initiator_id: initiator,
            recipient_id: *listing.user_id(),
            proposed_volume: request.proposed_volume,
            proposed_price: request.proposed_price,
            message: request.message,
            status: SwapStatus::Pending,
            proposed_at: self.clock.utc(),
            responded_at: None,
            completed_at: None,
        })
        .map_err(|error| Error::validation_failed(error.to_string()))?;

        match self.swaps.insert_pending(&swap).await {
            Ok(()) => Ok(swap),
            Err(SwapRepositoryError::DuplicateProposal) => Err(Error::validation_failed(
                "a pending proposal for this listing already exists",
            )),
            Err(error) => Err(map_swap_repo_error(error)),
        }
    }

    /// Accept or reject a pending proposal. Recipient only; an optional
    /// response message is appended to the stored thread.
    pub async fn respond(
        &self,
        swap_id: Uuid,
        caller: UserId,
        decision: SwapDecision,
        response: Option<String>,
    ) -> Result<Swap, Error> {
        let swap = self.load(swap_id).await?;
        if swap.recipient_id() != &caller {
            return Err(Error::forbidden(
                "only the recipient may respond to a proposal",
            ));
        }
        if !swap.status().allows_response() {
            return Err(Error::invalid_transition(format!(
                "cannot respond to a swap that is {}",
                swap.status()
            )));
        }

        let change = SwapTransition {
            status: decision.into(),
            responded_at: Some(self.clock.utc()),
            message: response.map(|text| Swap::appended_response(swap.message(), &text)),
        };
        self.transition(swap_id, &[SwapStatus::Pending], &change)
            .await
    }

    /// Cancel a pending or accepted swap. Either participant may cancel.
    pub async fn cancel(&self, swap_id: Uuid, caller: UserId) -> Result<Swap, Error> {
        let swap = self.load(swap_id).await?;
        if !swap.is_participant(&caller) {
            return Err(Error::forbidden("only a participant may cancel a swap"));
        }
        if !swap.status().allows_cancellation() {
            return Err(Error::invalid_transition(format!(
                "cannot cancel a swap that is {}",
                swap.status()
            )));
        }

        let change = SwapTransition {
            status: SwapStatus::Cancelled,
            responded_at: None,
            message: None,
        };
        self.transition(swap_id, &[SwapStatus::Pending, SwapStatus::Accepted], &change)
            .await
    }

    /// Settle an accepted swap: mark it completed and decrement the
    /// listing's volume in one transaction. Recipient only. A listing
    /// drained to zero volume is marked completed by the store.
    pub async fn complete(&self, swap_id: Uuid, caller: UserId) -> Result<Swap, Error> {
        let swap = self.load(swap_id).await?;
        if swap.recipient_id() != &caller {
            return Err(Error::forbidden("only the recipient may complete a swap"));
        }
        if !swap.status().allows_completion() {
            return Err(Error::invalid_transition(format!(
                "cannot complete a swap that is {}",
                swap.status()
            )));
        }

        match self.swaps.complete(&swap_id, self.clock.utc()).await {
            Ok(completion) => Ok(completion.swap),
            Err(SwapRepositoryError::StaleStatus { current }) => Err(Error::invalid_transition(
                format!("cannot complete a swap that is {current}"),
            )),
            Err(SwapRepositoryError::InsufficientVolume {
                available,
                requested,
            }) => Err(Error::validation_failed(format!(
                "proposed volume ({requested}) exceeds available volume ({available})"
            ))),
            Err(error) => Err(map_swap_repo_error(error)),
        }
    }

    /// Fetch a swap. Participants only.
    pub async fn get_swap(&self, swap_id: Uuid, caller: UserId) -> Result<Swap, Error> {
        let swap = self.load(swap_id).await?;
        if !swap.is_participant(&caller) {
            return Err(Error::forbidden("only a participant may view a swap"));
        }
        Ok(swap)
    }

    /// Swaps the caller participates in, newest first.
    pub async fn list_for_user(
        &self,
        caller: UserId,
        role: Option<SwapRole>,
        status: Option<SwapStatus>,
        page: &PageRequest,
    ) -> Result<Vec<Swap>, Error> {
        self.swaps
            .list_for_user(&caller, role, status, page)
            .await
            .map_err(map_swap_repo_error)
    }

    /// All swaps proposed against a listing. Listing owner only.
    pub async fn list_for_listing(
        &self,
        listing_id: Uuid,
        caller: UserId,
    ) -> Result<Vec<Swap>, Error> {
        let listing = self
            .listings
            .find_by_id(&listing_id)
            .await
            .map_err(map_listing_repo_error)?
            .ok_or_else(|| Error::not_found("listing not found"))?;
        if listing.user_id() != &caller {
            return Err(Error::forbidden(
                "only the owner may list a listing's swaps",
            ));
        }
        self.swaps
            .list_for_listing(&listing_id)
            .await
            .map_err(map_swap_repo_error)
    }

    async fn load(&self, swap_id: Uuid) -> Result<Swap, Error> {
        self.swaps
            .find_by_id(&swap_id)
            .await
            .map_err(map_swap_repo_error)?
            .ok_or_else(|| Error::not_found("swap not found"))
    }

    async fn transition(
        &self,
        swap_id: Uuid,
        expected: &[SwapStatus],
        change: &SwapTransition,
    ) -> Result<Swap, Error> {
        match self.swaps.transition(&swap_id, expected, change).await {
            Ok(swap) => Ok(swap),
            Err(SwapRepositoryError::StaleStatus { current }) => Err(Error::invalid_transition(
                format!("swap is already {current}"),
            )),
            Err(error) => Err(map_swap_repo_error(error)),
        }
    }
}

fn map_swap_repo_error(error: SwapRepositoryError) -> Error {
    debug!(%error, "swap repository operation failed");
    Error::infrastructure(error.to_string())
}

#[cfg(test)]
#[path = "swap_service_tests.rs"]
mod tests;
