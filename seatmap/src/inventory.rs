//! Seat inventory: the seat collection plus the current selection.
//!
//! Owns every seat and keeps the selection in the order seats were picked.
//! Seats are indexed by id so toggling is a keyed lookup and an in-place
//! status change.
//!
//! The selection always equals `{ seat : seat.status == Selected }`; every
//! mutating method preserves this and [`SeatInventory::check_invariants`]
//! verifies it.

use crate::error::BookingError;
use crate::types::{Seat, SeatId, SeatStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ============================================================================
// Data Structures
// ============================================================================

/// Result of a successful toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleOutcome {
    /// The seat was available and is now selected
    Selected,
    /// The seat was selected and is available again
    Deselected,
}

/// Seats sold by a purchase and what they cost
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// Purchased seats in selection order, already marked sold
    pub seats: Vec<Seat>,
    /// Sum of the purchased seats' prices
    pub total: u64,
}

impl PurchaseReceipt {
    /// Whether nothing was purchased
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Ids of the purchased seats
    #[must_use]
    pub fn seat_ids(&self) -> Vec<SeatId> {
        self.seats.iter().map(|seat| seat.id.clone()).collect()
    }
}

/// Seats of one sector, in inventory order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorSeats<'a> {
    /// Sector label
    pub name: &'a str,
    /// Seats belonging to the sector
    pub seats: Vec<&'a Seat>,
}

/// Per-sector seat counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorAvailability {
    /// Sector label
    pub sector: String,
    /// All seats in the sector
    pub total: usize,
    /// Seats free to select
    pub available: usize,
    /// Seats in the current selection
    pub selected: usize,
    /// Seats already sold
    pub sold: usize,
}

// ============================================================================
// Inventory
// ============================================================================

/// The seat collection and the current selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatInventory {
    seats: Vec<Seat>,
    index: HashMap<SeatId, usize>,
    /// Positions in `seats`, in selection order
    selection: Vec<usize>,
}

impl SeatInventory {
    /// Build an inventory from seats in display order
    ///
    /// Seats that arrive already `Selected` join the selection in the order
    /// given.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::DuplicateSeat`] if two seats share an id.
    pub fn new(seats: Vec<Seat>) -> Result<Self, BookingError> {
        let mut index = HashMap::with_capacity(seats.len());
        let mut selection = Vec::new();

        for (position, seat) in seats.iter().enumerate() {
            if index.insert(seat.id.clone(), position).is_some() {
                return Err(BookingError::DuplicateSeat(seat.id.clone()));
            }
            if seat.is_selected() {
                selection.push(position);
            }
        }

        Ok(Self {
            seats,
            index,
            selection,
        })
    }

    /// Toggle a seat in or out of the selection
    ///
    /// # Errors
    ///
    /// - [`BookingError::SeatNotFound`]: no seat has this id
    /// - [`BookingError::SeatUnavailable`]: the seat is sold
    ///
    /// The inventory is unchanged on error.
    pub fn toggle(&mut self, seat_id: &SeatId) -> Result<ToggleOutcome, BookingError> {
        let position = *self
            .index
            .get(seat_id)
            .ok_or_else(|| BookingError::SeatNotFound(seat_id.clone()))?;

        let Some(seat) = self.seats.get_mut(position) else {
            return Err(BookingError::SeatNotFound(seat_id.clone()));
        };

        let outcome = match seat.status {
            SeatStatus::Sold => return Err(BookingError::SeatUnavailable(seat_id.clone())),
            SeatStatus::Available => {
                seat.status = SeatStatus::Selected;
                self.selection.push(position);
                ToggleOutcome::Selected
            },
            SeatStatus::Selected => {
                seat.status = SeatStatus::Available;
                self.selection.retain(|selected| *selected != position);
                ToggleOutcome::Deselected
            },
        };

        debug_assert!(self.check_invariants().is_ok());
        Ok(outcome)
    }

    /// Sum of prices over the selection (0 when nothing is selected)
    #[must_use]
    pub fn total_price(&self) -> u64 {
        self.selected()
            .map(|seat| u64::from(seat.price.value()))
            .sum()
    }

    /// Mark every selected seat sold and clear the selection
    ///
    /// An empty selection is a no-op that returns an empty receipt.
    pub fn purchase(&mut self) -> PurchaseReceipt {
        let mut receipt = PurchaseReceipt::default();

        for position in std::mem::take(&mut self.selection) {
            if let Some(seat) = self.seats.get_mut(position) {
                seat.status = SeatStatus::Sold;
                receipt.total += u64::from(seat.price.value());
                receipt.seats.push(seat.clone());
            }
        }

        debug_assert!(self.check_invariants().is_ok());
        receipt
    }

    /// All seats in inventory order
    #[must_use]
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Selected seats in selection order
    #[must_use]
    pub fn selected_seats(&self) -> Vec<&Seat> {
        self.selected().collect()
    }

    /// Number of selected seats
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Look up a seat by id
    #[must_use]
    pub fn seat(&self, seat_id: &SeatId) -> Option<&Seat> {
        self.index
            .get(seat_id)
            .and_then(|position| self.seats.get(*position))
    }

    /// Number of seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether the inventory has no seats
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Seats grouped by sector, sectors in order of first appearance
    #[must_use]
    pub fn sectors(&self) -> Vec<SectorSeats<'_>> {
        let mut sectors: Vec<SectorSeats<'_>> = Vec::new();
        let mut lookup: HashMap<&str, usize> = HashMap::new();

        for seat in &self.seats {
            let slot = *lookup.entry(seat.sector.as_str()).or_insert_with(|| {
                sectors.push(SectorSeats {
                    name: seat.sector.as_str(),
                    seats: Vec::new(),
                });
                sectors.len() - 1
            });
            if let Some(sector) = sectors.get_mut(slot) {
                sector.seats.push(seat);
            }
        }

        sectors
    }

    /// Seat counts per sector, sectors in order of first appearance
    #[must_use]
    pub fn sector_availability(&self) -> Vec<SectorAvailability> {
        self.sectors()
            .into_iter()
            .map(|sector| {
                let count = |status: SeatStatus| {
                    sector
                        .seats
                        .iter()
                        .filter(|seat| seat.status == status)
                        .count()
                };
                SectorAvailability {
                    sector: sector.name.to_string(),
                    total: sector.seats.len(),
                    available: count(SeatStatus::Available),
                    selected: count(SeatStatus::Selected),
                    sold: count(SeatStatus::Sold),
                }
            })
            .collect()
    }

    /// Verify that the selection matches seat statuses and the index matches
    /// seat positions
    ///
    /// # Errors
    ///
    /// Returns a description of the first inconsistency found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.index.len() != self.seats.len() {
            return Err(format!(
                "index has {} entries for {} seats",
                self.index.len(),
                self.seats.len()
            ));
        }

        let selected: HashSet<usize> = self.selection.iter().copied().collect();
        if selected.len() != self.selection.len() {
            return Err("selection contains a seat twice".to_string());
        }

        for (position, seat) in self.seats.iter().enumerate() {
            if self.index.get(&seat.id) != Some(&position) {
                return Err(format!("seat {} is not indexed at {position}", seat.id));
            }

            let in_selection = selected.contains(&position);
            if seat.is_selected() != in_selection {
                return Err(format!(
                    "seat {} is {} but {} the selection",
                    seat.id,
                    seat.status,
                    if in_selection { "in" } else { "not in" }
                ));
            }
        }

        if let Some(position) = selected.iter().find(|position| **position >= self.seats.len()) {
            return Err(format!("selection refers to missing position {position}"));
        }

        Ok(())
    }

    fn selected(&self) -> impl Iterator<Item = &Seat> + '_ {
        self.selection
            .iter()
            .filter_map(|position| self.seats.get(*position))
    }
}
