//! Swap negotiation entity and its lifecycle state machine.
//!
//! A swap references exactly one listing, one initiator, and one recipient
//! (the listing's owner at proposal time). The permitted transitions are:
//!
//! ```text
//! pending  -> accepted | rejected | cancelled
//! accepted -> completed | cancelled
//! ```
//!
//! `rejected`, `completed`, and `cancelled` are terminal; no operation moves
//! a swap out of them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;

/// Validation errors returned by the swap constructors and parsers.
#[derive(Debug, Clone, PartialEq)]
pub enum SwapValidationError {
    InvalidVolume { value: f64 },
    InvalidPrice { value: f64 },
    UnknownStatus { value: String },
    /// `responded_at` must be null while the swap is pending.
    PrematureResponseTimestamp,
    /// `completed_at` must be set exactly when the status is `completed`.
    CompletionTimestampMismatch,
}

impl fmt::Display for SwapValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVolume { value } => {
                write!(
                    f,
                    "proposed volume must be a positive finite number, got {value}"
                )
            }
            Self::InvalidPrice { value } => {
                write!(
                    f,
                    "proposed price must be a non-negative finite number, got {value}"
                )
            }
            Self::UnknownStatus { value } => write!(f, "unknown swap status: {value:?}"),
            Self::PrematureResponseTimestamp => {
                write!(f, "responded_at must be unset while the swap is pending")
            }
            Self::CompletionTimestampMismatch => {
                write!(f, "completed_at must be set exactly for completed swaps")
            }
        }
    }
}

impl std::error::Error for SwapValidationError {}

/// Lifecycle state of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl SwapStatus {
    /// Stored string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Cancelled)
    }

    /// Whether the recipient may still accept or reject.
    pub fn allows_response(self) -> bool {
        self == Self::Pending
    }

    /// Whether a participant may still cancel.
    pub fn allows_cancellation(self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }

    /// Whether the recipient may mark the swap completed.
    pub fn allows_completion(self) -> bool {
        self == Self::Accepted
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapStatus {
    type Err = SwapValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(SwapValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

/// The recipient's verdict on a pending swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDecision {
    Accepted,
    Rejected,
}

impl From<SwapDecision> for SwapStatus {
    fn from(decision: SwapDecision) -> Self {
        match decision {
            SwapDecision::Accepted => Self::Accepted,
            SwapDecision::Rejected => Self::Rejected,
        }
    }
}

/// Which side of a swap a user is on, used for read filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapRole {
    Initiator,
    Recipient,
}

/// Field bundle used to construct a [`Swap`].
#[derive(Debug, Clone)]
pub struct SwapDraft {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub initiator_id: UserId,
    pub recipient_id: UserId,
    pub proposed_volume: f64,
    pub proposed_price: Option<f64>,
    pub message: Option<String>,
    pub status: SwapStatus,
    pub proposed_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A single swap negotiation.
///
/// ## Invariants
/// - `proposed_volume` is positive and finite.
/// - `responded_at` is null until the status leaves `pending`.
/// - `completed_at` is set if and only if the status is `completed`.
#[derive(Debug, Clone, PartialEq)]
pub struct Swap {
    id: Uuid,
    listing_id: Uuid,
    initiator_id: UserId,
    recipient_id: UserId,
    proposed_volume: f64,
    proposed_price: Option<f64>,
    message: Option<String>,
    status: SwapStatus,
    proposed_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Swap {
    /// Build a validated [`Swap`] from a draft.
    pub fn new(draft: SwapDraft) -> Result<Self, SwapValidationError> {
        let SwapDraft {
            id,
            listing_id,
            initiator_id,
            recipient_id,
            proposed_volume,
            proposed_price,
            message,
            status,
            proposed_at,
            responded_at,
            completed_at,
        } = draft;

        if !proposed_volume.is_finite() || proposed_volume <= 0.0 {
            return Err(SwapValidationError::InvalidVolume {
                value: proposed_volume,
            });
        }
        if let Some(price) = proposed_price {
            if !price.is_finite() || price < 0.0 {
                return Err(SwapValidationError::InvalidPrice { value: price });
            }
        }
        if status == SwapStatus::Pending && responded_at.is_some() {
            return Err(SwapValidationError::PrematureResponseTimestamp);
        }
        if (status == SwapStatus::Completed) != completed_at.is_some() {
            return Err(SwapValidationError::CompletionTimestampMismatch);
        }

        Ok(Self {
            id,
            listing_id,
            initiator_id,
            recipient_id,
            proposed_volume,
            proposed_price,
            message,
            status,
            proposed_at,
            responded_at,
            completed_at,
        })
    }

    /// Stable swap identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The listing this swap negotiates against.
    pub fn listing_id(&self) -> Uuid {
        self.listing_id
    }

    /// The user who proposed the swap.
    pub fn initiator_id(&self) -> &UserId {
        &self.initiator_id
    }

    /// The listing's owner at proposal time. This binding never changes.
    pub fn recipient_id(&self) -> &UserId {
        &self.recipient_id
    }

    /// Volume the initiator wants to trade.
    pub fn proposed_volume(&self) -> f64 {
        self.proposed_volume
    }

    /// Optional negotiated price.
    pub fn proposed_price(&self) -> Option<f64> {
        self.proposed_price
    }

    /// Free-text negotiation message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Lifecycle state.
    pub fn status(&self) -> SwapStatus {
        self.status
    }

    /// When the proposal was created.
    pub fn proposed_at(&self) -> DateTime<Utc> {
        self.proposed_at
    }

    /// When the recipient accepted or rejected, if they have.
    pub fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }

    /// When the swap completed, if it has.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Whether the given user is the initiator or the recipient.
    pub fn is_participant(&self, user_id: &UserId) -> bool {
        &self.initiator_id == user_id || &self.recipient_id == user_id
    }

    /// Join a response message onto an existing negotiation message.
    ///
    /// The response is appended, never overwriting what the initiator
    /// wrote: `"<original>\n\nResponse: <new>"`, or `"Response: <new>"`
    /// verbatim when there was no prior message.
    pub fn appended_response(existing: Option<&str>, response: &str) -> String {
        match existing {
            Some(original) => format!("{original}\n\nResponse: {response}"),
            None => format!("Response: {response}"),
        }
    }
}
