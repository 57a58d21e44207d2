//! Seat map demo
//!
//! Generates the stadium inventory, then drives a booking session through
//! the store:
//! - Fill animation running in the background
//! - Selecting seats and watching the total
//! - Trying a sold seat
//! - Purchasing and waiting for the acknowledgment to clear
//!
//! # Usage
//!
//! ```bash
//! SEATMAP_SEED=7 cargo run --bin seatmap-demo
//! cargo run --bin seatmap-demo -- --json   # also dump the seat snapshot
//! ```

use seatmap::{
    booking_store, BookingAction, BookingConfig, BookingEnvironment, BookingStore, SeatId,
    SeatInventory, VenueLayout,
};
use seatmap_core::environment::SystemClock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,seatmap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let dump_json = std::env::args().any(|arg| arg == "--json");

    let config = BookingConfig::from_env();
    tracing::info!(?config, "Loaded configuration");

    println!("\n============================================");
    println!("   Stadium Seat Map - Demo");
    println!("============================================\n");

    let mut seeder = config.seeder();
    let inventory = VenueLayout::stadium().generate(&mut seeder)?;
    print_availability(&inventory);

    let store = booking_store(
        inventory,
        BookingEnvironment::new(Arc::new(SystemClock), config.clone()),
    );

    store.send(BookingAction::StartFillAnimation).await?;

    // Two free seats from the best sector that has them
    let picks: Vec<SeatId> = store
        .state(|state| {
            state
                .inventory
                .sectors()
                .iter()
                .map(|sector| {
                    sector
                        .seats
                        .iter()
                        .filter(|seat| seat.is_available())
                        .take(2)
                        .map(|seat| seat.id.clone())
                        .collect::<Vec<_>>()
                })
                .find(|seats| !seats.is_empty())
                .unwrap_or_default()
        })
        .await;

    println!("1. Selecting seats");
    for seat_id in &picks {
        store
            .send(BookingAction::ToggleSeat {
                seat_id: seat_id.clone(),
            })
            .await?;
        let total = store.state(|state| state.inventory.total_price()).await;
        println!("   + {seat_id:<10} total: {total}");
    }

    let sold_seat = store
        .state(|state| {
            state
                .inventory
                .seats()
                .iter()
                .find(|seat| seat.is_sold())
                .map(|seat| seat.id.clone())
        })
        .await;

    if let Some(seat_id) = sold_seat {
        println!("\n2. Trying sold seat {seat_id}");
        store.send(BookingAction::ToggleSeat { seat_id }).await?;
        if let Some(error) = store.state(|state| state.last_error.clone()).await {
            println!("   rejected: {error}");
        }
    }

    println!("\n3. Purchasing");
    purchase(&store, &config).await?;

    let fill = store.state(|state| state.fill).await;
    println!("\n   fill animation at {}%", fill.percent);

    store.send(BookingAction::Teardown).await?;
    store.teardown().await?;

    let inventory = store.state(|state| state.inventory.clone()).await;
    println!();
    print_availability(&inventory);

    if dump_json {
        println!("{}", serde_json::to_string_pretty(inventory.seats())?);
    }

    Ok(())
}

async fn purchase(
    store: &BookingStore,
    config: &BookingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let has_selection = store
        .state(|state| state.inventory.selected_count() > 0)
        .await;

    if !config.purchase_enabled || !has_selection {
        store.send(BookingAction::Purchase).await?;
        match store.state(|state| state.last_error.clone()).await {
            Some(error) => println!("   rejected: {error}"),
            None => println!("   nothing to purchase"),
        }
        return Ok(());
    }

    let mut dismissed = store.subscribe_actions();
    store.send(BookingAction::Purchase).await?;

    if let Some(ack) = store.state(|state| state.acknowledgment.clone()).await {
        let seats: Vec<String> = ack.seats.iter().map(ToString::to_string).collect();
        println!("   purchased {} for {} at {}", seats.join(", "), ack.total, ack.confirmed_at);
    }

    let wait = config.acknowledgment_delay + Duration::from_secs(1);
    tokio::time::timeout(wait, async {
        loop {
            match dismissed.recv().await {
                Ok(BookingAction::DismissAcknowledgment) | Err(RecvError::Closed) => break,
                // Fill ticks can outpace this observer
                Ok(_) | Err(RecvError::Lagged(_)) => {},
            }
        }
    })
    .await?;

    let visible = store.state(|state| state.acknowledgment.is_some()).await;
    println!("   acknowledgment visible after {wait:?}: {visible}");
    Ok(())
}

fn print_availability(inventory: &SeatInventory) {
    println!("{:<6} {:>6} {:>10} {:>9} {:>6}", "sector", "total", "available", "selected", "sold");
    for sector in inventory.sector_availability() {
        println!(
            "{:<6} {:>6} {:>10} {:>9} {:>6}",
            sector.sector, sector.total, sector.available, sector.selected, sector.sold
        );
    }
    println!();
}
