//! Venue layouts and seeded inventory generation.
//!
//! A [`VenueLayout`] describes sectors as rectangular blocks of seats. Which
//! seats start sold is decided by an injected [`SoldSeeder`], so tests can
//! generate a known inventory and the demo can use a seeded RNG.

use crate::error::BookingError;
use crate::inventory::SeatInventory;
use crate::types::{Price, Seat, SeatId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// Layout
// ============================================================================

/// One sector (price tier) of a venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorLayout {
    /// Sector label, also used as the seat id prefix
    pub name: String,
    /// Price of every seat in the sector
    pub price: u32,
    /// Number of rows
    pub rows: u16,
    /// Seats in each row
    pub seats_per_row: u16,
}

impl SectorLayout {
    /// Creates a sector layout
    #[must_use]
    pub fn new(name: impl Into<String>, price: u32, rows: u16, seats_per_row: u16) -> Self {
        Self {
            name: name.into(),
            price,
            rows,
            seats_per_row,
        }
    }

    /// Number of seats in the sector
    #[must_use]
    pub fn capacity(&self) -> usize {
        usize::from(self.rows) * usize::from(self.seats_per_row)
    }

    /// Id of the seat at `row`, `number` (both 1-based)
    #[must_use]
    pub fn seat_id(&self, row: u16, number: u16) -> SeatId {
        SeatId::new(format!("{}-{row}-{number}", self.name))
    }
}

/// Sectors of a venue, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueLayout {
    /// Sectors in display order
    pub sectors: Vec<SectorLayout>,
}

impl VenueLayout {
    /// Creates a layout from sectors
    #[must_use]
    pub const fn new(sectors: Vec<SectorLayout>) -> Self {
        Self { sectors }
    }

    /// Four-tier stadium: VIP closest to the field, then A, B and C
    #[must_use]
    pub fn stadium() -> Self {
        Self::new(vec![
            SectorLayout::new("VIP", 5000, 2, 10),
            SectorLayout::new("A", 3500, 4, 12),
            SectorLayout::new("B", 2500, 5, 14),
            SectorLayout::new("C", 1500, 6, 16),
        ])
    }

    /// Total number of seats
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.sectors.iter().map(SectorLayout::capacity).sum()
    }

    /// Check that the layout can produce an inventory
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidLayout`] for an empty layout, a sector
    /// without a name, seats or price, or a repeated sector name.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.sectors.is_empty() {
            return Err(BookingError::InvalidLayout(
                "layout has no sectors".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for sector in &self.sectors {
            if sector.name.trim().is_empty() {
                return Err(BookingError::InvalidLayout(
                    "sector name is empty".to_string(),
                ));
            }
            if !names.insert(sector.name.as_str()) {
                return Err(BookingError::InvalidLayout(format!(
                    "sector {} appears twice",
                    sector.name
                )));
            }
            if sector.capacity() == 0 {
                return Err(BookingError::InvalidLayout(format!(
                    "sector {} has no seats",
                    sector.name
                )));
            }
            if sector.price == 0 {
                return Err(BookingError::InvalidLayout(format!(
                    "sector {} has no price",
                    sector.name
                )));
            }
        }

        Ok(())
    }

    /// Generate an inventory, asking `seeder` which seats start sold
    ///
    /// Seats are produced sector by sector, row by row.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidLayout`] if the layout fails
    /// [`VenueLayout::validate`].
    pub fn generate(&self, seeder: &mut dyn SoldSeeder) -> Result<SeatInventory, BookingError> {
        self.validate()?;

        let mut seats = Vec::with_capacity(self.capacity());
        for sector in &self.sectors {
            let price = Price::new(sector.price)?;
            for row in 1..=sector.rows {
                for number in 1..=sector.seats_per_row {
                    let seat = Seat::new(sector.seat_id(row, number), sector.name.as_str(), price)
                        .with_position(row, number);
                    let seat = if seeder.is_sold(&seat.id) {
                        seat.sold()
                    } else {
                        seat
                    };
                    seats.push(seat);
                }
            }
        }

        let inventory = SeatInventory::new(seats)?;
        tracing::debug!(
            seats = inventory.len(),
            sectors = self.sectors.len(),
            "Generated seat inventory"
        );
        Ok(inventory)
    }
}

impl SeatInventory {
    /// Generate an inventory from `layout`
    ///
    /// # Errors
    ///
    /// See [`VenueLayout::generate`].
    pub fn generate(
        layout: &VenueLayout,
        seeder: &mut dyn SoldSeeder,
    ) -> Result<Self, BookingError> {
        layout.generate(seeder)
    }
}

// ============================================================================
// Sold seeding
// ============================================================================

/// Decides which generated seats start sold
pub trait SoldSeeder {
    /// Whether `seat` starts sold
    fn is_sold(&mut self, seat: &SeatId) -> bool;
}

/// Marks each seat sold with a fixed probability
#[derive(Debug, Clone)]
pub struct RandomSeeder {
    rng: StdRng,
    sold_ratio: f64,
}

impl RandomSeeder {
    /// Deterministic seeder: the same seed yields the same inventory
    ///
    /// `sold_ratio` is clamped to 0.0..=1.0; NaN counts as 0.0.
    #[must_use]
    pub fn seeded(seed: u64, sold_ratio: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sold_ratio: probability(sold_ratio),
        }
    }

    /// Seeder drawing from OS entropy
    #[must_use]
    pub fn from_entropy(sold_ratio: f64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            sold_ratio: probability(sold_ratio),
        }
    }
}

/// Clamp a ratio into a valid probability
pub(crate) fn probability(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

impl SoldSeeder for RandomSeeder {
    fn is_sold(&mut self, _seat: &SeatId) -> bool {
        self.rng.gen_bool(self.sold_ratio)
    }
}

/// Marks exactly the listed seats sold
#[derive(Debug, Clone, Default)]
pub struct ExplicitSeeder {
    sold: HashSet<SeatId>,
}

impl ExplicitSeeder {
    /// Creates a seeder for the given sold ids
    #[must_use]
    pub fn new<I, S>(sold: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SeatId>,
    {
        Self {
            sold: sold.into_iter().map(Into::into).collect(),
        }
    }
}

impl SoldSeeder for ExplicitSeeder {
    fn is_sold(&mut self, seat: &SeatId) -> bool {
        self.sold.contains(seat)
    }
}

/// Every seat starts available
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSeatsSold;

impl SoldSeeder for NoSeatsSold {
    fn is_sold(&mut self, _seat: &SeatId) -> bool {
        false
    }
}
