//! Domain types for the seat map.
//!
//! Value objects for seats: identifiers, prices, positions and the
//! three-state seat status.

use crate::error::BookingError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a seat within an inventory
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(String);

impl SeatId {
    /// Creates a `SeatId` from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeatId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SeatId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// Price
// ============================================================================

/// Unit price of a seat, in whole currency units
///
/// Always positive. Totals over many seats are computed in `u64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Price(u32);

impl Price {
    /// Creates a price
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidPrice`] if `amount` is zero.
    pub const fn new(amount: u32) -> Result<Self, BookingError> {
        if amount == 0 {
            return Err(BookingError::InvalidPrice);
        }
        Ok(Self(amount))
    }

    /// Returns the amount
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Price {
    type Error = BookingError;

    fn try_from(amount: u32) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for u32 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Seat
// ============================================================================

/// Seat status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    /// Free to select
    Available,
    /// Chosen by the current user, not yet purchased
    Selected,
    /// Purchased (terminal)
    Sold,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "available",
            Self::Selected => "selected",
            Self::Sold => "sold",
        };
        f.write_str(label)
    }
}

/// Where a seat is drawn; carries no booking semantics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatPosition {
    /// 1-based row within the sector
    pub row: u16,
    /// 1-based seat number within the row
    pub number: u16,
}

/// A bookable seat
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Unique seat identifier
    pub id: SeatId,
    /// Sector (price tier) label, e.g. `VIP`
    pub sector: String,
    /// Unit price
    pub price: Price,
    /// Current status
    pub status: SeatStatus,
    /// Optional display position
    pub position: Option<SeatPosition>,
}

impl Seat {
    /// Creates an available seat without a display position
    #[must_use]
    pub fn new(id: impl Into<SeatId>, sector: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            sector: sector.into(),
            price,
            status: SeatStatus::Available,
            position: None,
        }
    }

    /// Set the display position
    #[must_use]
    pub const fn with_position(mut self, row: u16, number: u16) -> Self {
        self.position = Some(SeatPosition { row, number });
        self
    }

    /// Mark the seat as already sold (inventory seeding only)
    #[must_use]
    pub const fn sold(mut self) -> Self {
        self.status = SeatStatus::Sold;
        self
    }

    /// Whether the seat can be selected
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }

    /// Whether the seat is in the current selection
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.status == SeatStatus::Selected
    }

    /// Whether the seat has been sold
    #[must_use]
    pub fn is_sold(&self) -> bool {
        self.status == SeatStatus::Sold
    }
}
