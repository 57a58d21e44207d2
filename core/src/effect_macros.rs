//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use seatmap_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(3),
///     action: BookingAction::DismissAcknowledgment
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create a cancellable `Effect::Delay` registered under an [`EffectId`]
///
/// Scheduling the same id again replaces the pending timer.
///
/// [`EffectId`]: crate::effect::EffectId
///
/// # Example
///
/// ```rust,ignore
/// use seatmap_core::timer;
///
/// timer! {
///     id: FILL_TIMER,
///     after: config.fill_tick,
///     action: BookingAction::FillTick
/// }
/// ```
#[macro_export]
macro_rules! timer {
    (
        id: $id:expr,
        after: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            effect: ::std::boxed::Box::new($crate::delay! {
                duration: $duration,
                action: $action
            }),
        }
    };
}
