//! End-to-end ledger and lifecycle scenarios against the in-memory store.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/expect

use boxoffice_core::ledger::{LedgerError, SeatLedger};
use boxoffice_core::lifecycle::{RedeemError, TicketLifecycle};
use boxoffice_core::store::TicketStore;
use boxoffice_core::types::{BookingStatus, CustomerId, EventRecord, Money, SeatCount};
use boxoffice_memory::InMemoryTicketStore;
use boxoffice_testing::{event_with_seats, test_clock};
use std::sync::Arc;

struct Harness {
    store: Arc<InMemoryTicketStore>,
    ledger: SeatLedger,
    lifecycle: TicketLifecycle,
}

async fn harness_with_event(event: EventRecord) -> Harness {
    let store = Arc::new(InMemoryTicketStore::new());
    store.insert_event(event).await.expect("seed event");
    let clock = Arc::new(test_clock());
    Harness {
        ledger: SeatLedger::new(store.clone(), clock.clone()),
        lifecycle: TicketLifecycle::new(store.clone(), clock),
        store,
    }
}

fn seats(n: u32) -> SeatCount {
    SeatCount::new(n).unwrap()
}

async fn available(store: &InMemoryTicketStore, event: &EventRecord) -> u32 {
    store
        .load_event(event.id)
        .await
        .unwrap()
        .expect("event exists")
        .record
        .available_seats
}

#[tokio::test]
async fn book_cancel_then_redeem_is_rejected() {
    // Event with 100 seats at $50: the walkthrough scenario.
    let event = event_with_seats(100, 5000);
    let h = harness_with_event(event.clone()).await;
    let customer = CustomerId::new();

    let booking = h
        .ledger
        .create_booking(event.id, customer, seats(3))
        .await
        .expect("booking succeeds");
    assert_eq!(booking.total_amount, Money::from_cents(15000));
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(available(&h.store, &event).await, 97);

    let cancelled = h
        .ledger
        .cancel_booking(booking.id, customer)
        .await
        .expect("cancellation succeeds");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(available(&h.store, &event).await, 100);

    let result = h.lifecycle.redeem(&booking.reference).await;
    assert!(matches!(result, Err(RedeemError::TicketCancelled)));
}

#[tokio::test]
async fn redeem_once_then_rejected_with_original_timestamp() {
    let event = event_with_seats(50, 2500);
    let h = harness_with_event(event.clone()).await;
    let customer = CustomerId::new();

    let booking = h
        .ledger
        .create_booking(event.id, customer, seats(2))
        .await
        .unwrap();

    let receipt = h
        .lifecycle
        .redeem(&booking.reference)
        .await
        .expect("first redemption succeeds");
    assert_eq!(receipt.booking_id, booking.id);
    assert_eq!(receipt.seats, seats(2));

    let stored = h
        .store
        .load_booking(booking.id)
        .await
        .unwrap()
        .unwrap()
        .record;
    assert_eq!(stored.checked_in_at(), Some(receipt.checked_in_at));

    match h.lifecycle.redeem(&booking.reference).await {
        Err(RedeemError::AlreadyRedeemed { checked_in_at }) => {
            assert_eq!(checked_in_at, receipt.checked_in_at);
        }
        other => panic!("expected AlreadyRedeemed, got {other:?}"),
    }

    // Redemption never touches seat counts.
    assert_eq!(available(&h.store, &event).await, 48);
}

#[tokio::test]
async fn insufficient_inventory_mutates_nothing() {
    let event = event_with_seats(5, 1000);
    let h = harness_with_event(event.clone()).await;

    let result = h
        .ledger
        .create_booking(event.id, CustomerId::new(), seats(6))
        .await;
    match result {
        Err(LedgerError::InsufficientInventory {
            requested,
            available,
        }) => {
            assert_eq!(requested, 6);
            assert_eq!(available, 5);
        }
        other => panic!("expected InsufficientInventory, got {other:?}"),
    }

    assert_eq!(available(&h.store, &event).await, 5);
    assert_eq!(h.store.booking_count().await, 0);
}

#[tokio::test]
async fn booking_against_unknown_event_fails() {
    let h = harness_with_event(event_with_seats(5, 1000)).await;
    let missing = event_with_seats(1, 100);

    let result = h
        .ledger
        .create_booking(missing.id, CustomerId::new(), seats(1))
        .await;
    assert!(matches!(result, Err(LedgerError::EventNotFound(id)) if id == missing.id));
}

#[tokio::test]
async fn only_the_owner_may_cancel() {
    let event = event_with_seats(10, 1000);
    let h = harness_with_event(event.clone()).await;
    let owner = CustomerId::new();

    let booking = h
        .ledger
        .create_booking(event.id, owner, seats(4))
        .await
        .unwrap();

    let result = h.ledger.cancel_booking(booking.id, CustomerId::new()).await;
    assert!(matches!(result, Err(LedgerError::Forbidden)));

    // The rejected cancellation changed nothing.
    assert_eq!(available(&h.store, &event).await, 6);
    let stored = h
        .store
        .load_booking(booking.id)
        .await
        .unwrap()
        .unwrap()
        .record;
    assert_eq!(stored.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn double_cancel_is_rejected_without_double_credit() {
    let event = event_with_seats(10, 1000);
    let h = harness_with_event(event.clone()).await;
    let customer = CustomerId::new();

    let booking = h
        .ledger
        .create_booking(event.id, customer, seats(4))
        .await
        .unwrap();
    assert_eq!(available(&h.store, &event).await, 6);

    h.ledger.cancel_booking(booking.id, customer).await.unwrap();
    assert_eq!(available(&h.store, &event).await, 10);

    let result = h.ledger.cancel_booking(booking.id, customer).await;
    assert!(matches!(result, Err(LedgerError::AlreadyCancelled)));
    assert_eq!(available(&h.store, &event).await, 10);
}

#[tokio::test]
async fn cancelling_a_used_ticket_is_rejected() {
    let event = event_with_seats(10, 1000);
    let h = harness_with_event(event.clone()).await;
    let customer = CustomerId::new();

    let booking = h
        .ledger
        .create_booking(event.id, customer, seats(3))
        .await
        .unwrap();
    let receipt = h.lifecycle.redeem(&booking.reference).await.unwrap();

    let result = h.ledger.cancel_booking(booking.id, customer).await;
    match result {
        Err(LedgerError::AlreadyRedeemed { checked_in_at }) => {
            assert_eq!(checked_in_at, receipt.checked_in_at);
        }
        other => panic!("expected AlreadyRedeemed, got {other:?}"),
    }

    // Seats of a consumed ticket are never credited back.
    assert_eq!(available(&h.store, &event).await, 7);
}

#[tokio::test]
async fn cancellation_survives_event_deletion() {
    let event = event_with_seats(10, 1000);
    let h = harness_with_event(event.clone()).await;
    let customer = CustomerId::new();

    let booking = h
        .ledger
        .create_booking(event.id, customer, seats(2))
        .await
        .unwrap();
    h.store.remove_event(event.id).await.unwrap();

    let cancelled = h
        .ledger
        .cancel_booking(booking.id, customer)
        .await
        .expect("cancellation succeeds without the event");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(h.store.load_event(event.id).await.unwrap().is_none());
}

#[tokio::test]
async fn booking_lookup_enforces_ownership() {
    let event = event_with_seats(10, 1000);
    let h = harness_with_event(event.clone()).await;
    let owner = CustomerId::new();

    let booking = h
        .ledger
        .create_booking(event.id, owner, seats(1))
        .await
        .unwrap();

    let fetched = h.ledger.booking_for(booking.id, owner).await.unwrap();
    assert_eq!(fetched.id, booking.id);

    let result = h.ledger.booking_for(booking.id, CustomerId::new()).await;
    assert!(matches!(result, Err(LedgerError::Forbidden)));
}

#[tokio::test]
async fn seats_are_conserved_across_the_lifecycle() {
    let event = event_with_seats(20, 1000);
    let h = harness_with_event(event.clone()).await;
    let customer = CustomerId::new();

    let a = h
        .ledger
        .create_booking(event.id, customer, seats(5))
        .await
        .unwrap();
    let b = h
        .ledger
        .create_booking(event.id, customer, seats(3))
        .await
        .unwrap();
    let c = h
        .ledger
        .create_booking(event.id, customer, seats(2))
        .await
        .unwrap();

    h.ledger.cancel_booking(b.id, customer).await.unwrap();
    h.lifecycle.redeem(&c.reference).await.unwrap();

    // total - available == seats held by confirmed + used bookings.
    let remaining = available(&h.store, &event).await;
    let held: u32 = h
        .ledger
        .bookings_for(customer)
        .await
        .unwrap()
        .iter()
        .filter(|booking| !matches!(booking.status, BookingStatus::Cancelled))
        .map(|booking| booking.seats.get())
        .sum();
    assert_eq!(event.total_seats - remaining, held);
    assert_eq!(held, a.seats.get() + c.seats.get());
}
