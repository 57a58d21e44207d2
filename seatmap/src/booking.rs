//! Booking feature: seat selection, purchase and timed UI state.
//!
//! Wraps a [`SeatInventory`] in a reducer. Besides seat toggling and
//! purchasing it owns two timers:
//!
//! - the purchase acknowledgment, dismissed after
//!   [`BookingConfig::acknowledgment_delay`] ([`ACKNOWLEDGMENT_TIMER`])
//! - the decorative fill animation, ticking every
//!   [`BookingConfig::fill_tick`] until stopped ([`FILL_TIMER`])
//!
//! Both are cancellable effects, so [`BookingAction::Teardown`] (or dropping
//! the store) guarantees neither fires against a discarded model.

use crate::config::{BookingConfig, ErrorPolicy};
use crate::error::BookingError;
use crate::inventory::SeatInventory;
use crate::types::SeatId;
use chrono::{DateTime, Utc};
use seatmap_core::{
    effect::{Effect, EffectId},
    environment::Clock,
    reducer::Reducer,
    smallvec, timer, SmallVec,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Timer that clears the purchase acknowledgment
pub const ACKNOWLEDGMENT_TIMER: EffectId = EffectId::new("booking.acknowledgment");

/// Timer driving the fill animation
pub const FILL_TIMER: EffectId = EffectId::new("booking.fill");

// ============================================================================
// State
// ============================================================================

/// Transient confirmation shown after a purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseAcknowledgment {
    /// Purchased seats, in selection order
    pub seats: Vec<SeatId>,
    /// Amount charged
    pub total: u64,
    /// When the purchase went through
    pub confirmed_at: DateTime<Utc>,
}

/// Decorative progress indicator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillAnimation {
    /// Current fill, 0..=100
    pub percent: u8,
    /// Whether ticks are scheduled
    pub running: bool,
}

impl FillAnimation {
    /// Advance by `step`, wrapping to 0 once past 100
    fn advance(&mut self, step: u8) {
        let next = u16::from(self.percent) + u16::from(step);
        self.percent = if next > 100 {
            0
        } else {
            u8::try_from(next).unwrap_or(0)
        };
    }
}

/// State of the booking feature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingState {
    /// Seats and the current selection
    pub inventory: SeatInventory,
    /// Visible purchase confirmation, if any
    pub acknowledgment: Option<PurchaseAcknowledgment>,
    /// Fill animation
    pub fill: FillAnimation,
    /// Last rejected operation (only recorded under [`ErrorPolicy::Strict`])
    pub last_error: Option<BookingError>,
}

impl BookingState {
    /// Creates state around an inventory
    #[must_use]
    pub fn new(inventory: SeatInventory) -> Self {
        Self {
            inventory,
            ..Self::default()
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Actions of the booking feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BookingAction {
    /// Select an available seat or deselect a selected one
    ToggleSeat {
        /// Seat to toggle
        seat_id: SeatId,
    },
    /// Buy every selected seat
    Purchase,
    /// Hide the purchase acknowledgment (fed back by its timer)
    DismissAcknowledgment,
    /// Start the fill animation
    StartFillAnimation,
    /// Advance the fill animation (fed back by its timer)
    FillTick,
    /// Stop the fill animation
    StopFillAnimation,
    /// Stop every timer the feature owns
    Teardown,
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the booking reducer
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Time source for acknowledgment timestamps
    pub clock: Arc<dyn Clock>,
    /// Feature configuration
    pub config: BookingConfig,
}

impl BookingEnvironment {
    /// Creates an environment
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, config: BookingConfig) -> Self {
        Self { clock, config }
    }
}

impl std::fmt::Debug for BookingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEnvironment")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the booking feature
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a booking reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Apply the configured error policy to a rejected operation
    fn reject(state: &mut BookingState, policy: ErrorPolicy, error: BookingError) {
        match policy {
            ErrorPolicy::Lenient => {
                tracing::debug!(%error, "Ignoring rejected booking operation");
            },
            ErrorPolicy::Strict => {
                tracing::warn!(%error, "Booking operation rejected");
                state.last_error = Some(error);
            },
        }
    }

    fn purchase(
        state: &mut BookingState,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingAction>; 4]> {
        if !env.config.purchase_enabled {
            Self::reject(state, env.config.error_policy, BookingError::PurchaseUnsupported);
            return smallvec![Effect::None];
        }

        let receipt = state.inventory.purchase();
        if receipt.is_empty() {
            tracing::debug!("Purchase with empty selection ignored");
            return smallvec![Effect::None];
        }

        tracing::info!(
            seats = receipt.seats.len(),
            total = receipt.total,
            "Seats purchased"
        );

        state.last_error = None;
        state.acknowledgment = Some(PurchaseAcknowledgment {
            seats: receipt.seat_ids(),
            total: receipt.total,
            confirmed_at: env.clock.now(),
        });

        // Replaces any dismissal still pending from an earlier purchase
        smallvec![timer! {
            id: ACKNOWLEDGMENT_TIMER,
            after: env.config.acknowledgment_delay,
            action: BookingAction::DismissAcknowledgment
        }]
    }

    fn schedule_fill_tick(env: &BookingEnvironment) -> Effect<BookingAction> {
        timer! {
            id: FILL_TIMER,
            after: env.config.fill_tick,
            action: BookingAction::FillTick
        }
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            BookingAction::ToggleSeat { seat_id } => {
                match state.inventory.toggle(&seat_id) {
                    Ok(outcome) => {
                        tracing::debug!(
                            seat = %seat_id,
                            ?outcome,
                            total = state.inventory.total_price(),
                            "Seat toggled"
                        );
                        state.last_error = None;
                    },
                    Err(error) => Self::reject(state, env.config.error_policy, error),
                }
                smallvec![Effect::None]
            },

            BookingAction::Purchase => Self::purchase(state, env),

            BookingAction::DismissAcknowledgment => {
                if state.acknowledgment.take().is_some() {
                    tracing::debug!("Purchase acknowledgment dismissed");
                }
                smallvec![Effect::None]
            },

            BookingAction::StartFillAnimation => {
                if state.fill.running {
                    return smallvec![Effect::None];
                }
                state.fill.running = true;
                tracing::debug!(tick = ?env.config.fill_tick, "Fill animation started");
                smallvec![Self::schedule_fill_tick(env)]
            },

            BookingAction::FillTick => {
                // A tick already in flight when the animation stopped
                if !state.fill.running {
                    return smallvec![Effect::None];
                }
                state.fill.advance(env.config.fill_step);
                tracing::trace!(percent = state.fill.percent, "Fill tick");
                smallvec![Self::schedule_fill_tick(env)]
            },

            BookingAction::StopFillAnimation => {
                state.fill.running = false;
                tracing::debug!(percent = state.fill.percent, "Fill animation stopped");
                smallvec![Effect::Cancel(FILL_TIMER)]
            },

            BookingAction::Teardown => {
                state.fill.running = false;
                tracing::debug!("Booking timers torn down");
                smallvec![
                    Effect::Cancel(FILL_TIMER),
                    Effect::Cancel(ACKNOWLEDGMENT_TIMER)
                ]
            },
        }
    }
}
