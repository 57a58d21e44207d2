//! Error types for seat booking.

use crate::types::SeatId;
use thiserror::Error;

/// Errors raised by inventory and booking operations
///
/// Every variant is recoverable: the inventory is left exactly as it was
/// before the failing call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// No seat with this id exists in the inventory
    #[error("Seat {0} not found")]
    SeatNotFound(SeatId),

    /// The seat is sold and can no longer be selected
    #[error("Seat {0} is already sold")]
    SeatUnavailable(SeatId),

    /// Purchasing is disabled for this seat map
    #[error("Purchasing is not available for this seat map")]
    PurchaseUnsupported,

    /// Two seats share an id
    #[error("Duplicate seat id {0}")]
    DuplicateSeat(SeatId),

    /// A seat price must be positive
    #[error("Seat price must be greater than zero")]
    InvalidPrice,

    /// The venue layout cannot produce an inventory
    #[error("Invalid venue layout: {0}")]
    InvalidLayout(String),
}

/// Errors raised while loading [`BookingConfig`](crate::config::BookingConfig)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        /// Environment variable name
        key: &'static str,
        /// Raw value found
        value: String,
        /// What the variable must contain
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_seat() {
        let error = BookingError::SeatUnavailable(SeatId::from("VIP-1-3"));
        assert_eq!(error.to_string(), "Seat VIP-1-3 is already sold");
    }

    #[test]
    fn config_error_reports_key_and_value() {
        let error = ConfigError::InvalidValue {
            key: "SEATMAP_FILL_STEP",
            value: "lots".to_string(),
            expected: "an integer between 1 and 100",
        };
        assert_eq!(
            error.to_string(),
            "Invalid value \"lots\" for SEATMAP_FILL_STEP: expected an integer between 1 and 100"
        );
    }
}
