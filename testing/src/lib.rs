//! # Seatmap Testing
//!
//! Testing utilities and helpers for the seatmap workspace.
//!
//! This crate provides:
//! - Deterministic implementations of Environment traits
//! - A Given-When-Then builder for reducers
//! - Assertion helpers for returned effects
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use seatmap_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(BookingReducer::new())
//!     .with_env(BookingEnvironment::new(Arc::new(test_clock()), BookingConfig::default()))
//!     .given_state(state)
//!     .when_action(BookingAction::Purchase)
//!     .then_state(|state| assert!(state.inventory.selected_seats().is_empty()))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use seatmap_core::environment::Clock;


pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use seatmap_testing::mocks::FixedClock;
    /// use seatmap_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }
}

/// Property-based testing utilities using proptest
pub mod properties {
    use proptest::prelude::*;
    use proptest::sample::select;

    /// Sequences of up to `max_len` picks from `items`, repeats allowed
    ///
    /// Useful for driving a reducer with random interleavings of a fixed
    /// set of commands (e.g. toggling seats by id).
    ///
    /// # Panics
    ///
    /// The returned strategy panics when sampled if `items` is empty.
    pub fn picks<T>(items: Vec<T>, max_len: usize) -> impl Strategy<Value = Vec<T>>
    where
        T: Clone + std::fmt::Debug + 'static,
    {
        proptest::collection::vec(select(items), 0..=max_len)
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_clock_is_new_year_2025() {
        let now = test_clock().now();
        assert_eq!((now.year(), now.month(), now.day()), (2025, 1, 1));
    }

    proptest! {
        #[test]
        fn picks_stay_within_items(seq in properties::picks(vec!['a', 'b', 'c'], 12)) {
            prop_assert!(seq.len() <= 12);
            prop_assert!(seq.iter().all(|c| ['a', 'b', 'c'].contains(c)));
        }
    }
}
