//! Seat selection and pricing for stadium booking views.
//!
//! The [`SeatInventory`] holds every seat of a venue and the seats the user
//! has picked; it toggles seats, totals their price and turns a selection
//! into a purchase. The booking feature hosts the inventory in a reducer so
//! it can run inside a [`seatmap_runtime::Store`] together with the timers a
//! booking view needs (acknowledgment auto-dismiss and a fill animation).
//!
//! # Architecture
//!
//! ```text
//! VenueLayout ──generate(SoldSeeder)──▶ SeatInventory
//!                                           │
//!                                     BookingState
//!                                           │
//!  BookingAction ──▶ Store ──▶ BookingReducer ──▶ Effects (timers)
//!        ▲                                            │
//!        └──────────── DismissAcknowledgment / FillTick
//! ```
//!
//! # Example
//!
//! ```
//! use seatmap::{Price, Seat, SeatId, SeatInventory};
//!
//! # fn main() -> Result<(), seatmap::BookingError> {
//! let mut inventory = SeatInventory::new(vec![
//!     Seat::new("A", "Front", Price::new(100)?),
//!     Seat::new("B", "Front", Price::new(200)?).sold(),
//! ])?;
//!
//! inventory.toggle(&SeatId::from("A"))?;
//! assert_eq!(inventory.total_price(), 100);
//!
//! let receipt = inventory.purchase();
//! assert_eq!(receipt.total, 100);
//! assert!(inventory.selected_seats().is_empty());
//! # Ok(())
//! # }
//! ```

pub mod booking;
pub mod config;
pub mod error;
pub mod inventory;
pub mod layout;
pub mod types;

pub use booking::{
    BookingAction, BookingEnvironment, BookingReducer, BookingState, FillAnimation,
    PurchaseAcknowledgment, ACKNOWLEDGMENT_TIMER, FILL_TIMER,
};
pub use config::{BookingConfig, ErrorPolicy};
pub use error::{BookingError, ConfigError};
pub use inventory::{
    PurchaseReceipt, SeatInventory, SectorAvailability, SectorSeats, ToggleOutcome,
};
pub use layout::{ExplicitSeeder, NoSeatsSold, RandomSeeder, SectorLayout, SoldSeeder, VenueLayout};
pub use types::{Price, Seat, SeatId, SeatPosition, SeatStatus};

use seatmap_runtime::Store;

/// Store running the booking feature
pub type BookingStore = Store<BookingState, BookingAction, BookingEnvironment, BookingReducer>;

/// Create a store for `inventory`
#[must_use]
pub fn booking_store(inventory: SeatInventory, environment: BookingEnvironment) -> BookingStore {
    Store::new(BookingState::new(inventory), BookingReducer::new(), environment)
}
