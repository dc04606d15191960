//! Property tests: arbitrary operation sequences preserve the inventory
//! invariants.
//!
//! For every event, at all times: `0 <= available_seats <= total_seats`,
//! and `total_seats - available_seats` equals the seats held by its
//! confirmed and used bookings.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use boxoffice_core::ledger::SeatLedger;
use boxoffice_core::lifecycle::TicketLifecycle;
use boxoffice_core::store::TicketStore;
use boxoffice_core::types::{Booking, BookingStatus, CustomerId, EventRecord, SeatCount};
use boxoffice_memory::InMemoryTicketStore;
use boxoffice_testing::{event_with_seats, test_clock};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Create { event_slot: usize, seats: u32 },
    Cancel { pick: usize },
    Redeem { pick: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 1..4u32).prop_map(|(event_slot, seats)| Op::Create { event_slot, seats }),
        (0..16usize).prop_map(|pick| Op::Cancel { pick }),
        (0..16usize).prop_map(|pick| Op::Redeem { pick }),
    ]
}

async fn assert_invariants(store: &InMemoryTicketStore, events: &[EventRecord], created: &[Booking]) {
    for event in events {
        let current = store
            .load_event(event.id)
            .await
            .unwrap()
            .expect("events are never deleted here")
            .record;
        assert!(
            current.available_seats <= current.total_seats,
            "available {} exceeds total {}",
            current.available_seats,
            current.total_seats
        );

        let mut held = 0;
        for booking in created {
            if booking.event_id != event.id {
                continue;
            }
            let stored = store
                .load_booking(booking.id)
                .await
                .unwrap()
                .expect("bookings are never deleted")
                .record;
            if !matches!(stored.status, BookingStatus::Cancelled) {
                held += stored.seats.get();
            }
        }
        assert_eq!(
            current.total_seats - current.available_seats,
            held,
            "debited seats must equal seats held by confirmed+used bookings"
        );
    }
}

async fn run_ops(ops: Vec<Op>) {
    let store = Arc::new(InMemoryTicketStore::new());
    let events = [
        event_with_seats(4, 1000),
        event_with_seats(7, 2500),
        event_with_seats(10, 500),
    ];
    for event in &events {
        store.insert_event(event.clone()).await.unwrap();
    }

    let clock = Arc::new(test_clock());
    let ledger = SeatLedger::new(store.clone(), clock.clone());
    let lifecycle = TicketLifecycle::new(store.clone(), clock);
    let customer = CustomerId::new();
    let mut created: Vec<Booking> = Vec::new();

    for op in ops {
        match op {
            Op::Create { event_slot, seats } => {
                let event = &events[event_slot];
                if let Ok(booking) = ledger
                    .create_booking(event.id, customer, SeatCount::new(seats).unwrap())
                    .await
                {
                    created.push(booking);
                }
            }
            Op::Cancel { pick } => {
                if !created.is_empty() {
                    let booking = &created[pick % created.len()];
                    // Rejections (already cancelled, already used) are part
                    // of the sequence under test.
                    let _ = ledger.cancel_booking(booking.id, customer).await;
                }
            }
            Op::Redeem { pick } => {
                if !created.is_empty() {
                    let booking = &created[pick % created.len()];
                    let _ = lifecycle.redeem(&booking.reference).await;
                }
            }
        }
        assert_invariants(&store, &events, &created).await;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn operation_sequences_preserve_inventory_invariants(
        ops in proptest::collection::vec(op_strategy(), 1..40)
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(run_ops(ops));
    }
}
