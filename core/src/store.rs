//! Store abstraction for events and bookings.
//!
//! This module defines the persistence contract the ledger and lifecycle
//! services are written against. It is deliberately minimal: load a
//! document with its version, and commit a write set atomically under
//! optimistic concurrency. Any engine with either multi-row transactions or
//! a compare-and-swap covering the affected documents can implement it.
//!
//! # Concurrency model
//!
//! Every stored document carries a [`Version`]. Updates name the version
//! they were computed from; a mismatch fails the whole commit with
//! [`StoreError::VersionConflict`] and applies nothing. Callers re-read and
//! re-decide — the re-read-and-retry-on-conflict loop lives in
//! [`SeatLedger`](crate::ledger::SeatLedger) and
//! [`TicketLifecycle`](crate::lifecycle::TicketLifecycle), driven by
//! [`RetryPolicy`](crate::retry::RetryPolicy).
//!
//! Operations touching disjoint documents never contend: there is no
//! store-wide lock in the contract, only per-document version checks.
//!
//! # Implementations
//!
//! - `InMemoryTicketStore` (in `boxoffice-memory`): reference backend and
//!   test harness.
//!
//! # Dyn Compatibility
//!
//! The trait uses explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` so services can hold an `Arc<dyn TicketStore>`.

use crate::types::{Booking, BookingId, CustomerId, EventId, EventRecord, ReferenceCode};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Monotonic per-document version used for optimistic concurrency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u64);

impl Version {
    /// Creates a version.
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// The version as a number.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The version after one more write.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document together with the version it was read at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned<T> {
    /// The stored document.
    pub record: T,
    /// Version observed at read time; pass it back when updating.
    pub version: Version,
}

/// One write inside an atomic commit.
#[derive(Clone, Debug)]
pub enum Write {
    /// Insert a brand-new booking. Fails the commit with
    /// [`StoreError::DuplicateBooking`] if the id or reference code is
    /// already taken.
    InsertBooking(Booking),
    /// Replace a booking, asserting it is still at `expected`.
    UpdateBooking {
        /// The new booking state.
        booking: Booking,
        /// Version the update was computed from.
        expected: Version,
    },
    /// Replace an event, asserting it is still at `expected`.
    UpdateEvent {
        /// The new event state.
        event: EventRecord,
        /// Version the update was computed from.
        expected: Version,
    },
}

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Optimistic concurrency conflict: a document in the write set moved
    /// since it was read. The whole commit was discarded; re-read and
    /// retry.
    #[error("concurrency conflict on {document}: expected version {expected}, found {actual}")]
    VersionConflict {
        /// Human-readable identifier of the conflicting document.
        document: String,
        /// The version the writer expected.
        expected: Version,
        /// The version actually stored.
        actual: Version,
    },

    /// Insert of a booking whose id or reference code already exists.
    #[error("duplicate booking: {0}")]
    DuplicateBooking(String),

    /// Backend connection or query failure. Transient; the operation was
    /// rolled back and is safe to retry from the caller's side.
    #[error("store connection error: {0}")]
    Connection(String),
}

impl StoreError {
    /// Whether the error is a version conflict worth an in-process retry.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Persistence contract for events and bookings.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the services share them as
/// `Arc<dyn TicketStore>` across concurrent request tasks.
pub trait TicketStore: Send + Sync {
    /// Load an event by id, with its current version.
    ///
    /// Returns `None` if the event does not exist (deleted events are
    /// absent, not errors — the cancellation path relies on this).
    ///
    /// # Errors
    ///
    /// [`StoreError::Connection`] on backend failure.
    fn load_event(&self, id: EventId) -> StoreFuture<'_, Option<Versioned<EventRecord>>>;

    /// Create an event with all seats available.
    ///
    /// This is the event-management collaborator's surface; the ledger
    /// itself never creates events.
    ///
    /// # Errors
    ///
    /// [`StoreError::Connection`] on backend failure.
    fn insert_event(&self, event: EventRecord) -> StoreFuture<'_, ()>;

    /// Delete an event. Bookings against it are left untouched.
    ///
    /// # Errors
    ///
    /// [`StoreError::Connection`] on backend failure.
    fn remove_event(&self, id: EventId) -> StoreFuture<'_, ()>;

    /// Load a booking by id, with its current version.
    ///
    /// # Errors
    ///
    /// [`StoreError::Connection`] on backend failure.
    fn load_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Versioned<Booking>>>;

    /// Look up a booking by its reference code (exact match).
    ///
    /// # Errors
    ///
    /// [`StoreError::Connection`] on backend failure.
    fn find_by_reference(
        &self,
        reference: &ReferenceCode,
    ) -> StoreFuture<'_, Option<Versioned<Booking>>>;

    /// All bookings owned by a customer, newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Connection`] on backend failure.
    fn bookings_for_customer(&self, customer: CustomerId) -> StoreFuture<'_, Vec<Booking>>;

    /// Apply a write set atomically: either every write takes effect or
    /// none does.
    ///
    /// # Errors
    ///
    /// - [`StoreError::VersionConflict`]: some expected version did not
    ///   match; nothing was applied.
    /// - [`StoreError::DuplicateBooking`]: an insert collided on id or
    ///   reference code; nothing was applied.
    /// - [`StoreError::Connection`]: backend failure; nothing was applied.
    fn commit(&self, writes: Vec<Write>) -> StoreFuture<'_, ()>;
}
