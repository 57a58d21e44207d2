//! Integration tests for the booking feature running inside a Store
//!
//! Timer behaviour is checked with tokio's paused clock: sleeping in the test
//! advances virtual time and fires every timer due before the deadline.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use seatmap::{
    booking_store, BookingAction, BookingConfig, BookingEnvironment, BookingError, BookingStore,
    Price, Seat, SeatId, SeatInventory, SeatStatus, ACKNOWLEDGMENT_TIMER, FILL_TIMER,
};
use seatmap_runtime::StoreError;
use seatmap_testing::test_clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::sleep;

// ============================================================================
// Test Fixtures
// ============================================================================

/// A(100, available), B(200, sold), C(300, available)
fn inventory() -> SeatInventory {
    SeatInventory::new(vec![
        Seat::new("A", "Front", Price::new(100).unwrap()),
        Seat::new("B", "Front", Price::new(200).unwrap()).sold(),
        Seat::new("C", "Back", Price::new(300).unwrap()),
    ])
    .unwrap()
}

fn config() -> BookingConfig {
    BookingConfig::default()
        .with_acknowledgment_delay(Duration::from_millis(3000))
        .with_fill_tick(Duration::from_millis(50))
        .with_fill_step(1)
}

fn store(config: BookingConfig) -> BookingStore {
    booking_store(
        inventory(),
        BookingEnvironment::new(Arc::new(test_clock()), config),
    )
}

fn toggle(id: &str) -> BookingAction {
    BookingAction::ToggleSeat {
        seat_id: SeatId::from(id),
    }
}

async fn select_and_purchase(store: &BookingStore, ids: &[&str]) {
    for id in ids {
        store.send(toggle(id)).await.unwrap();
    }
    store.send(BookingAction::Purchase).await.unwrap();
}

async fn acknowledgment_visible(store: &BookingStore) -> bool {
    store.state(|s| s.acknowledgment.is_some()).await
}

async fn fill_percent(store: &BookingStore) -> u8 {
    store.state(|s| s.fill.percent).await
}

// ============================================================================
// Selection and purchase
// ============================================================================

#[tokio::test]
async fn scenario_through_the_store() {
    let store = store(config());

    store.send(toggle("A")).await.unwrap();
    assert_eq!(store.state(|s| s.inventory.total_price()).await, 100);

    store.send(toggle("C")).await.unwrap();
    assert_eq!(store.state(|s| s.inventory.total_price()).await, 400);

    store.send(toggle("B")).await.unwrap();
    let (selected, error) = store
        .state(|s| (s.inventory.selected_count(), s.last_error.clone()))
        .await;
    assert_eq!(selected, 2);
    assert_eq!(error, Some(BookingError::SeatUnavailable(SeatId::from("B"))));

    store.send(BookingAction::Purchase).await.unwrap();
    store
        .state(|s| {
            assert!(s.inventory.seats().iter().all(|seat| seat.status == SeatStatus::Sold));
            assert!(s.inventory.selected_seats().is_empty());
            assert_eq!(s.inventory.total_price(), 0);
            assert_eq!(s.acknowledgment.as_ref().unwrap().total, 400);
            s.inventory.check_invariants().unwrap();
        })
        .await;

    store.teardown().await.unwrap();
}

// ============================================================================
// Acknowledgment timer
// ============================================================================

#[tokio::test(start_paused = true)]
async fn acknowledgment_clears_after_delay() {
    let store = store(config());
    select_and_purchase(&store, &["A"]).await;

    assert!(acknowledgment_visible(&store).await);
    assert!(store.is_running(ACKNOWLEDGMENT_TIMER));

    sleep(Duration::from_millis(2990)).await;
    assert!(acknowledgment_visible(&store).await);

    sleep(Duration::from_millis(20)).await;
    assert!(!acknowledgment_visible(&store).await);
    assert!(!store.is_running(ACKNOWLEDGMENT_TIMER));
    assert_eq!(store.running_effects(), 0);
}

#[tokio::test(start_paused = true)]
async fn dismissal_is_observable() {
    let store = store(config());
    store.send(toggle("C")).await.unwrap();

    let action = store
        .send_and_wait_for(
            BookingAction::Purchase,
            |action| *action == BookingAction::DismissAcknowledgment,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(action, BookingAction::DismissAcknowledgment);
    assert!(!acknowledgment_visible(&store).await);
}

#[tokio::test(start_paused = true)]
async fn second_purchase_restarts_dismissal() {
    let store = store(config());
    select_and_purchase(&store, &["A"]).await;

    sleep(Duration::from_millis(2000)).await;
    select_and_purchase(&store, &["C"]).await;
    assert_eq!(store.running_effects(), 1);

    // Past the first purchase's deadline
    sleep(Duration::from_millis(1500)).await;
    let seats = store
        .state(|s| s.acknowledgment.as_ref().map(|ack| ack.seats.clone()))
        .await;
    assert_eq!(seats, Some(vec![SeatId::from("C")]));

    sleep(Duration::from_millis(1600)).await;
    assert!(!acknowledgment_visible(&store).await);
}

#[tokio::test(start_paused = true)]
async fn teardown_before_delay_keeps_acknowledgment() {
    let store = store(config());
    select_and_purchase(&store, &["A"]).await;

    sleep(Duration::from_millis(1000)).await;
    store.send(BookingAction::Teardown).await.unwrap();

    assert!(!store.is_running(ACKNOWLEDGMENT_TIMER));

    sleep(Duration::from_secs(10)).await;
    assert!(acknowledgment_visible(&store).await);
    assert_eq!(store.running_effects(), 0);
}

// ============================================================================
// Fill animation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn fill_animation_ticks_until_stopped() {
    let store = store(config());
    store.send(BookingAction::StartFillAnimation).await.unwrap();

    sleep(Duration::from_millis(525)).await;
    assert_eq!(fill_percent(&store).await, 10);
    assert!(store.is_running(FILL_TIMER));

    store.send(BookingAction::StopFillAnimation).await.unwrap();
    let stopped_at = fill_percent(&store).await;
    assert!(!store.is_running(FILL_TIMER));

    sleep(Duration::from_secs(2)).await;
    assert_eq!(fill_percent(&store).await, stopped_at);
    assert!(!store.state(|s| s.fill.running).await);
}

#[tokio::test(start_paused = true)]
async fn fill_animation_wraps_around() {
    let store = store(config().with_fill_step(25));
    store.send(BookingAction::StartFillAnimation).await.unwrap();

    // Ticks: 25, 50, 75, 100, 0, 25
    sleep(Duration::from_millis(310)).await;
    assert_eq!(fill_percent(&store).await, 25);

    store.send(BookingAction::Teardown).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_fill_animation() {
    let store = store(config());
    store.send(BookingAction::StartFillAnimation).await.unwrap();

    sleep(Duration::from_millis(210)).await;
    store.send(BookingAction::Teardown).await.unwrap();
    let torn_down_at = fill_percent(&store).await;
    assert_eq!(torn_down_at, 4);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(fill_percent(&store).await, torn_down_at);
    assert_eq!(store.running_effects(), 0);
}

// ============================================================================
// Store lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn dropping_the_store_releases_timers() {
    let store = store(config());
    let mut observed = store.subscribe_actions();

    store.send(BookingAction::StartFillAnimation).await.unwrap();
    select_and_purchase(&store, &["A"]).await;
    sleep(Duration::from_millis(120)).await;

    drop(store);

    // The channel closes once the store and every timer holding it are gone
    let drained = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            match observed.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => {},
                Err(RecvError::Closed) => break,
            }
        }
    })
    .await;
    assert!(drained.is_ok(), "timers kept the store alive");
}

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_timers_and_rejects_actions() {
    let store = store(config());
    store.send(BookingAction::StartFillAnimation).await.unwrap();
    select_and_purchase(&store, &["A"]).await;
    assert_eq!(store.running_effects(), 2);

    store.shutdown(Duration::from_secs(1)).await.unwrap();

    assert!(store.is_shut_down());
    assert_eq!(store.running_effects(), 0);
    assert!(matches!(
        store.send(toggle("C")).await,
        Err(StoreError::ShutdownInProgress)
    ));

    sleep(Duration::from_secs(5)).await;
    assert!(acknowledgment_visible(&store).await);
}
