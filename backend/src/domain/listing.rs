//! Tradable energy capacity listings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;

/// Validation errors returned by the listing constructors and parsers.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingValidationError {
    InvalidVolume { value: f64 },
    InvalidPrice { value: f64 },
    EmptyLocation,
    EmptyTimeWindow,
    UnknownListingType { value: String },
    UnknownEnergyType { value: String },
    UnknownStatus { value: String },
}

impl fmt::Display for ListingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVolume { value } => {
                write!(f, "volume must be a positive finite number, got {value}")
            }
            Self::InvalidPrice { value } => {
                write!(f, "price must be a non-negative finite number, got {value}")
            }
            Self::EmptyLocation => write!(f, "location must not be empty"),
            Self::EmptyTimeWindow => write!(f, "start time must be before end time"),
            Self::UnknownListingType { value } => {
                write!(f, "unknown listing type: {value:?}")
            }
            Self::UnknownEnergyType { value } => {
                write!(f, "unknown energy type: {value:?}")
            }
            Self::UnknownStatus { value } => write!(f, "unknown listing status: {value:?}"),
        }
    }
}

impl std::error::Error for ListingValidationError {}

/// Whether a listing offers capacity or asks for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Demand,
    Supply,
}

impl ListingType {
    /// The counterparty side used by the matching engine.
    pub fn opposite(self) -> Self {
        match self {
            Self::Demand => Self::Supply,
            Self::Supply => Self::Demand,
        }
    }

    /// Stored string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Demand => "demand",
            Self::Supply => "supply",
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingType {
    type Err = ListingValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "demand" => Ok(Self::Demand),
            "supply" => Ok(Self::Supply),
            other => Err(ListingValidationError::UnknownListingType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Kind of renewable energy being traded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    Solar,
    Wind,
}

impl EnergyType {
    /// Stored string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solar => "solar",
            Self::Wind => "wind",
        }
    }
}

impl fmt::Display for EnergyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergyType {
    type Err = ListingValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "solar" => Ok(Self::Solar),
            "wind" => Ok(Self::Wind),
            other => Err(ListingValidationError::UnknownEnergyType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Lifecycle state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Inactive,
    Completed,
    Cancelled,
}

impl ListingStatus {
    /// Stored string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = ListingValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ListingValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

/// Half-open delivery window `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Validate and construct a window.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ListingValidationError> {
        if start >= end {
            return Err(ListingValidationError::EmptyTimeWindow);
        }
        Ok(Self { start, end })
    }

    /// Window start.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Window end.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Inclusive-bound interval intersection used by the matching engine:
    /// `other.start <= self.end && other.end >= self.start`.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        other.start <= self.end && other.end >= self.start
    }
}

/// Field bundle used to construct a [`Listing`].
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub id: Uuid,
    pub user_id: UserId,
    pub listing_type: ListingType,
    pub energy_type: EnergyType,
    pub volume: f64,
    pub price: f64,
    pub location: String,
    pub description: Option<String>,
    pub window: TimeWindow,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
}

/// A published block of tradable energy capacity.
///
/// ## Invariants
/// - `volume` is positive and finite at construction; it only ever moves
///   downward as swaps complete, floored at zero.
/// - A volume of exactly zero forces `status` to [`ListingStatus::Completed`].
/// - `window.start < window.end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    id: Uuid,
    user_id: UserId,
    listing_type: ListingType,
    energy_type: EnergyType,
    volume: f64,
    price: f64,
    location: String,
    description: Option<String>,
    window: TimeWindow,
    status: ListingStatus,
    created_at: DateTime<Utc>,
}

impl Listing {
    /// Build a validated [`Listing`] from a draft.
    pub fn new(draft: ListingDraft) -> Result<Self, ListingValidationError> {
        let ListingDraft {
            id,
            user_id,
            listing_type,
            energy_type,
            volume,
            price,
            location,
            description,
            window,
            status,
            created_at,
        } = draft;

        if !volume.is_finite() || volume <= 0.0 {
            return Err(ListingValidationError::InvalidVolume { value: volume });
        }
        if !price.is_finite() || price < 0.0 {
            return Err(ListingValidationError::InvalidPrice { value: price });
        }
        if location.trim().is_empty() {
            return Err(ListingValidationError::EmptyLocation);
        }

        Ok(Self {
            id,
            user_id,
            listing_type,
            energy_type,
            volume,
            price,
            location,
            description,
            window,
            status,
            created_at,
        })
    }

    /// Stable listing identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owning user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Supply or demand side.
    pub fn listing_type(&self) -> ListingType {
        self.listing_type
    }

    /// Kind of energy being traded.
    pub fn energy_type(&self) -> EnergyType {
        self.energy_type
    }

    /// Remaining tradable volume.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Asking price.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Location of the farm or consumption site.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Free-text description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Delivery window.
    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Lifecycle state.
    pub fn status(&self) -> ListingStatus {
        self.status
    }

    /// Record creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Apply a completed swap's volume against this listing.
    ///
    /// Decrements the remaining volume, floored at zero. A volume of
    /// exactly zero forces the status to [`ListingStatus::Completed`].
    /// The caller is responsible for persisting the change atomically with
    /// the swap that triggered it.
    pub fn apply_completed_volume(&mut self, proposed_volume: f64) {
        self.volume = (self.volume - proposed_volume).max(0.0);
        if self.volume == 0.0 {
            self.status = ListingStatus::Completed;
        }
    }
}
