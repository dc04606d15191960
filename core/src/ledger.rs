//! Seat ledger: atomic seat debit and credit against event inventory.
//!
//! The ledger owns the `0 <= available_seats <= total_seats` invariant. A
//! booking creation reads the event, checks availability, debits seats and
//! persists the new booking as one atomic commit; a cancellation reverses
//! the debit under the ticket state machine's rules. Concurrent operations
//! on the same event are serialized by the store's per-document version
//! check: the loser of a race re-reads and re-decides, so the inventory can
//! never be oversold and a booking can never exist without its seats having
//! been debited (or vice versa).

use crate::environment::Clock;
use crate::retry::{RetryPolicy, retry_with_predicate};
use crate::store::{StoreError, TicketStore, Versioned, Write};
use crate::types::{Booking, BookingId, BookingStatus, CustomerId, EventId, SeatCount};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Errors returned by ledger operations.
///
/// Everything here except [`LedgerError::Store`] is an expected, user-facing
/// rejection; none of them indicate partial state (a failed operation
/// mutates nothing).
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The referenced event does not exist.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// The referenced booking does not exist.
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    /// More seats were requested than are available. Carries the actual
    /// count so the caller can resubmit with an adjusted quantity.
    #[error("only {available} seats available ({requested} requested)")]
    InsufficientInventory {
        /// Seats the caller asked for.
        requested: u32,
        /// Seats actually available at decision time.
        available: u32,
    },

    /// The requester does not own the booking.
    #[error("access denied: booking belongs to another customer")]
    Forbidden,

    /// The booking is already cancelled; cancelling twice is rejected, not
    /// silently accepted.
    #[error("booking already cancelled")]
    AlreadyCancelled,

    /// The ticket was already redeemed; a consumed ticket cannot be
    /// cancelled and its seats are never credited back.
    #[error("ticket already used (checked in at {checked_in_at})")]
    AlreadyRedeemed {
        /// When the ticket was checked in.
        checked_in_at: DateTime<Utc>,
    },

    /// `ticket_price × seats` does not fit in a money amount.
    #[error("booking total overflows")]
    AmountOverflow,

    /// Underlying store failure. The atomic unit was rolled back; the whole
    /// operation is safe to retry.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Whether the error is an optimistic-concurrency conflict that the
    /// ledger retries internally.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_conflict())
    }
}

/// The seat ledger service.
///
/// Cheap to clone; shares the store and clock behind `Arc`s so one instance
/// can serve many concurrent request tasks.
#[derive(Clone)]
pub struct SeatLedger {
    store: Arc<dyn TicketStore>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl SeatLedger {
    /// Creates a ledger over the given store and clock with the default
    /// conflict-retry policy.
    #[must_use]
    pub fn new(store: Arc<dyn TicketStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_retry(store, clock, RetryPolicy::default())
    }

    /// Creates a ledger with an explicit conflict-retry policy.
    #[must_use]
    pub const fn with_retry(
        store: Arc<dyn TicketStore>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            retry,
        }
    }

    /// Books `seats` against an event for a customer.
    ///
    /// Reads the event, checks availability, debits the seats and persists
    /// the new confirmed booking as one atomic unit. Version conflicts with
    /// concurrent bookings or cancellations on the same event are retried
    /// internally; every retry re-reads and re-checks, so a request that
    /// lost the race for the last seats fails with
    /// [`LedgerError::InsufficientInventory`] rather than overselling.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EventNotFound`]: no such event.
    /// - [`LedgerError::InsufficientInventory`]: not enough seats; nothing
    ///   was mutated.
    /// - [`LedgerError::AmountOverflow`]: price × seats overflows.
    /// - [`LedgerError::Store`]: backend failure or retry budget exhausted;
    ///   nothing was mutated.
    #[instrument(skip(self))]
    pub async fn create_booking(
        &self,
        event_id: EventId,
        customer_id: CustomerId,
        seats: SeatCount,
    ) -> Result<Booking, LedgerError> {
        retry_with_predicate(
            &self.retry,
            || self.try_create(event_id, customer_id, seats),
            LedgerError::is_conflict,
        )
        .await
    }

    async fn try_create(
        &self,
        event_id: EventId,
        customer_id: CustomerId,
        seats: SeatCount,
    ) -> Result<Booking, LedgerError> {
        let Some(Versioned {
            record: mut event,
            version,
        }) = self.store.load_event(event_id).await?
        else {
            return Err(LedgerError::EventNotFound(event_id));
        };

        let total_amount = event
            .ticket_price
            .checked_mul(seats.get())
            .ok_or(LedgerError::AmountOverflow)?;

        if !event.debit(seats) {
            return Err(LedgerError::InsufficientInventory {
                requested: seats.get(),
                available: event.available_seats,
            });
        }

        let booking = Booking::new(event_id, customer_id, seats, total_amount, self.clock.now());

        self.store
            .commit(vec![
                Write::InsertBooking(booking.clone()),
                Write::UpdateEvent {
                    event,
                    expected: version,
                },
            ])
            .await?;

        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            total = %booking.total_amount,
            "booking confirmed"
        );
        Ok(booking)
    }

    /// Cancels a confirmed booking and credits its seats back to the event.
    ///
    /// Only the owning customer may cancel. The status transition and the
    /// seat credit commit as one atomic unit; if the event has since been
    /// deleted the cancellation still succeeds and the credit is skipped.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::BookingNotFound`]: no such booking.
    /// - [`LedgerError::Forbidden`]: requester does not own the booking.
    /// - [`LedgerError::AlreadyCancelled`]: the booking was already
    ///   cancelled; no further seat credit happens.
    /// - [`LedgerError::AlreadyRedeemed`]: the ticket was already consumed.
    /// - [`LedgerError::Store`]: backend failure; nothing was mutated.
    #[instrument(skip(self))]
    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
        requester: CustomerId,
    ) -> Result<Booking, LedgerError> {
        retry_with_predicate(
            &self.retry,
            || self.try_cancel(booking_id, requester),
            LedgerError::is_conflict,
        )
        .await
    }

    async fn try_cancel(
        &self,
        booking_id: BookingId,
        requester: CustomerId,
    ) -> Result<Booking, LedgerError> {
        let Some(Versioned {
            record: mut booking,
            version,
        }) = self.store.load_booking(booking_id).await?
        else {
            return Err(LedgerError::BookingNotFound(booking_id));
        };

        if booking.customer_id != requester {
            return Err(LedgerError::Forbidden);
        }
        match booking.status {
            BookingStatus::Cancelled => return Err(LedgerError::AlreadyCancelled),
            BookingStatus::Used { checked_in_at } => {
                return Err(LedgerError::AlreadyRedeemed { checked_in_at });
            }
            BookingStatus::Confirmed => {}
        }

        booking.status = BookingStatus::Cancelled;
        let mut writes = vec![Write::UpdateBooking {
            booking: booking.clone(),
            expected: version,
        }];

        // The event may have been deleted by the event-management
        // collaborator; the cancellation itself still goes through.
        match self.store.load_event(booking.event_id).await? {
            Some(Versioned {
                record: mut event,
                version: event_version,
            }) => {
                event.credit(booking.seats);
                writes.push(Write::UpdateEvent {
                    event,
                    expected: event_version,
                });
            }
            None => {
                warn!(event_id = %booking.event_id, "event gone, skipping seat credit");
            }
        }

        self.store.commit(writes).await?;

        info!(seats = %booking.seats, "booking cancelled");
        Ok(booking)
    }

    /// Fetches a booking, enforcing ownership.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::BookingNotFound`]: no such booking.
    /// - [`LedgerError::Forbidden`]: requester does not own the booking.
    /// - [`LedgerError::Store`]: backend failure.
    pub async fn booking_for(
        &self,
        booking_id: BookingId,
        requester: CustomerId,
    ) -> Result<Booking, LedgerError> {
        let Some(Versioned { record: booking, .. }) = self.store.load_booking(booking_id).await?
        else {
            return Err(LedgerError::BookingNotFound(booking_id));
        };
        if booking.customer_id != requester {
            return Err(LedgerError::Forbidden);
        }
        Ok(booking)
    }

    /// All bookings owned by a customer, newest first.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Store`] on backend failure.
    pub async fn bookings_for(&self, customer: CustomerId) -> Result<Vec<Booking>, LedgerError> {
        Ok(self.store.bookings_for_customer(customer).await?)
    }
}
