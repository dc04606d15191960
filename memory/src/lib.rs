//! # Boxoffice Memory
//!
//! In-memory implementation of the boxoffice store contract.
//!
//! Reference backend and test harness: versioned maps for events and
//! bookings plus a reference-code index, guarded by a `tokio::sync::RwLock`.
//! The lock is held only while a single load or commit runs — never across
//! a caller's read-modify-write — so the optimistic version check in
//! [`commit`](boxoffice_core::store::TicketStore::commit) is what
//! serializes concurrent operations on the same document, exactly as it
//! would against a real document store.

use boxoffice_core::store::{StoreError, StoreFuture, TicketStore, Version, Versioned, Write};
use boxoffice_core::types::{Booking, BookingId, CustomerId, EventId, EventRecord, ReferenceCode};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    events: HashMap<EventId, (EventRecord, Version)>,
    bookings: HashMap<BookingId, (Booking, Version)>,
    by_reference: HashMap<String, BookingId>,
}

/// In-memory versioned document store.
///
/// Wrap it in an `Arc` and hand it to [`SeatLedger`] and
/// [`TicketLifecycle`] as `Arc<dyn TicketStore>`.
///
/// [`SeatLedger`]: boxoffice_core::ledger::SeatLedger
/// [`TicketLifecycle`]: boxoffice_core::lifecycle::TicketLifecycle
#[derive(Default)]
pub struct InMemoryTicketStore {
    inner: RwLock<Inner>,
}

impl InMemoryTicketStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bookings ever created (none are physically deleted).
    pub async fn booking_count(&self) -> usize {
        self.inner.read().await.bookings.len()
    }
}

/// Validates a write set against current versions without applying it.
///
/// Commit is two-phase so a failure in any write leaves every document
/// untouched. Live documents are versioned from 1; an absent (deleted)
/// document reports version 0 in the conflict, so a stale update can never
/// resurrect it — the caller re-reads and finds it gone.
fn validate(inner: &Inner, writes: &[Write]) -> Result<(), StoreError> {
    for write in writes {
        match write {
            Write::InsertBooking(booking) => {
                if inner.bookings.contains_key(&booking.id) {
                    return Err(StoreError::DuplicateBooking(booking.id.to_string()));
                }
                if inner.by_reference.contains_key(booking.reference.as_str()) {
                    return Err(StoreError::DuplicateBooking(booking.reference.to_string()));
                }
            }
            Write::UpdateBooking { booking, expected } => {
                let actual = inner
                    .bookings
                    .get(&booking.id)
                    .map_or(Version::new(0), |(_, v)| *v);
                if actual != *expected {
                    return Err(StoreError::VersionConflict {
                        document: format!("booking/{}", booking.id),
                        expected: *expected,
                        actual,
                    });
                }
            }
            Write::UpdateEvent { event, expected } => {
                let actual = inner
                    .events
                    .get(&event.id)
                    .map_or(Version::new(0), |(_, v)| *v);
                if actual != *expected {
                    return Err(StoreError::VersionConflict {
                        document: format!("event/{}", event.id),
                        expected: *expected,
                        actual,
                    });
                }
            }
        }
    }
    Ok(())
}

fn apply(inner: &mut Inner, writes: Vec<Write>) {
    for write in writes {
        match write {
            Write::InsertBooking(booking) => {
                inner
                    .by_reference
                    .insert(booking.reference.as_str().to_string(), booking.id);
                inner.bookings.insert(booking.id, (booking, Version::new(1)));
            }
            Write::UpdateBooking { booking, expected } => {
                inner
                    .bookings
                    .insert(booking.id, (booking, expected.next()));
            }
            Write::UpdateEvent { event, expected } => {
                inner.events.insert(event.id, (event, expected.next()));
            }
        }
    }
}

impl TicketStore for InMemoryTicketStore {
    fn load_event(&self, id: EventId) -> StoreFuture<'_, Option<Versioned<EventRecord>>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            Ok(inner.events.get(&id).map(|(record, version)| Versioned {
                record: record.clone(),
                version: *version,
            }))
        })
    }

    fn insert_event(&self, event: EventRecord) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            inner.events.insert(event.id, (event, Version::new(1)));
            Ok(())
        })
    }

    fn remove_event(&self, id: EventId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            inner.events.remove(&id);
            Ok(())
        })
    }

    fn load_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Versioned<Booking>>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            Ok(inner.bookings.get(&id).map(|(record, version)| Versioned {
                record: record.clone(),
                version: *version,
            }))
        })
    }

    fn find_by_reference(
        &self,
        reference: &ReferenceCode,
    ) -> StoreFuture<'_, Option<Versioned<Booking>>> {
        let key = reference.as_str().to_string();
        Box::pin(async move {
            let inner = self.inner.read().await;
            let Some(id) = inner.by_reference.get(&key) else {
                return Ok(None);
            };
            Ok(inner.bookings.get(id).map(|(record, version)| Versioned {
                record: record.clone(),
                version: *version,
            }))
        })
    }

    fn bookings_for_customer(&self, customer: CustomerId) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            let mut bookings: Vec<Booking> = inner
                .bookings
                .values()
                .filter(|(booking, _)| booking.customer_id == customer)
                .map(|(booking, _)| booking.clone())
                .collect();
            bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
            Ok(bookings)
        })
    }

    fn commit(&self, writes: Vec<Write>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            validate(&inner, &writes)?;
            apply(&mut inner, writes);
            Ok(())
        })
    }
}
