//! Domain types for the boxoffice ticketing core.
//!
//! Value objects and entities shared by the seat ledger and the ticket
//! lifecycle: identifiers, money, seat quantities, the inventory view of an
//! event, and the booking record that doubles as the redeemable ticket.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a customer.
///
/// Opaque: the identity collaborator verifies it before it reaches the
/// ledger, and nothing here dereferences it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Creates a new random `CustomerId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `CustomerId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from dollars with overflow checking.
    #[must_use]
    pub const fn checked_from_dollars(dollars: u64) -> Option<Self> {
        match dollars.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies the amount by a seat quantity with overflow checking.
    #[must_use]
    pub const fn checked_mul(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Seat Quantity
// ============================================================================

/// A positive number of seats.
///
/// Booking a zero-seat ticket is rejected at construction, so every ledger
/// operation can rely on `get() >= 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatCount(u32);

impl SeatCount {
    /// Creates a `SeatCount`, rejecting zero.
    #[must_use]
    pub const fn new(seats: u32) -> Option<Self> {
        if seats == 0 { None } else { Some(Self(seats)) }
    }

    /// Returns the number of seats.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeatCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Reference Code
// ============================================================================

/// Length of the random suffix appended to the timestamp component.
const REFERENCE_SUFFIX_LEN: usize = 9;

/// Unique opaque credential identifying a booking for redemption.
///
/// Derived from the creation timestamp (milliseconds) plus a random
/// alphanumeric suffix, so collisions across bookings are negligible. The
/// code is assigned inside [`Booking::new`]: no booking is ever visible to
/// a reader without one. Callers treat it as an opaque string; the
/// presentation layer renders it into whatever scannable encoding it likes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceCode(String);

impl ReferenceCode {
    /// Generates a fresh reference code for a booking created at `now`.
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(REFERENCE_SUFFIX_LEN)
            .map(|c| char::from(c).to_ascii_uppercase())
            .collect();
        Self(format!("BK{}{suffix}", now.timestamp_millis()))
    }

    /// Wraps an existing code, e.g. one scanned at the venue.
    #[must_use]
    pub fn from_string(code: String) -> Self {
        Self(code)
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event (inventory view)
// ============================================================================

/// The inventory view of a schedulable event.
///
/// Metadata (title, venue, schedule) lives with the event-management
/// collaborator; the ledger only ever reads `ticket_price` and mutates
/// `available_seats`. Invariant: `available_seats <= total_seats`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event identifier.
    pub id: EventId,
    /// Seat capacity, fixed at creation.
    pub total_seats: u32,
    /// Seats still available for booking.
    pub available_seats: u32,
    /// Price per seat.
    pub ticket_price: Money,
}

impl EventRecord {
    /// Creates a new event with all seats available.
    #[must_use]
    pub const fn new(id: EventId, total_seats: u32, ticket_price: Money) -> Self {
        Self {
            id,
            total_seats,
            available_seats: total_seats,
            ticket_price,
        }
    }

    /// Debits `seats` from the available pool.
    ///
    /// Returns `false` without mutating when fewer than `seats` are
    /// available. The compare and the subtract happen together so the
    /// ledger has a single place where the no-oversell rule lives.
    #[must_use]
    pub fn debit(&mut self, seats: SeatCount) -> bool {
        if self.available_seats < seats.get() {
            return false;
        }
        self.available_seats -= seats.get();
        true
    }

    /// Credits `seats` back to the available pool on cancellation.
    pub fn credit(&mut self, seats: SeatCount) {
        self.available_seats = self.available_seats.saturating_add(seats.get());
    }
}

// ============================================================================
// Booking (the ticket)
// ============================================================================

/// Lifecycle state of a booking.
///
/// `confirmed` is the initial state; `cancelled` and `used` are terminal.
/// The check-in timestamp rides inside `Used` so it can only ever be set by
/// the one transition that consumes the ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Active reservation, seats debited.
    Confirmed,
    /// Cancelled by the owner, seats credited back.
    Cancelled,
    /// Redeemed at the venue.
    Used {
        /// When the ticket was checked in.
        checked_in_at: DateTime<Utc>,
    },
}

/// One customer's reservation of seats against one event.
///
/// Doubles as the redeemable ticket. Never physically deleted: cancelled
/// and used bookings stay in the store as the audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// The event the seats were booked against.
    pub event_id: EventId,
    /// The customer who owns the booking.
    pub customer_id: CustomerId,
    /// Number of seats reserved, fixed at creation.
    pub seats: SeatCount,
    /// `ticket_price × seats` at booking time; later price changes to the
    /// event never touch it.
    pub total_amount: Money,
    /// Redemption credential, unique across all bookings.
    pub reference: ReferenceCode,
    /// Current lifecycle state.
    pub status: BookingStatus,
    /// When the booking was created.
    pub booked_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a confirmed booking with a freshly generated id and
    /// reference code.
    #[must_use]
    pub fn new(
        event_id: EventId,
        customer_id: CustomerId,
        seats: SeatCount,
        total_amount: Money,
        booked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookingId::new(),
            event_id,
            customer_id,
            seats,
            total_amount,
            reference: ReferenceCode::generate(booked_at),
            status: BookingStatus::Confirmed,
            booked_at,
        }
    }

    /// When the ticket was redeemed, if it has been.
    #[must_use]
    pub const fn checked_in_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            BookingStatus::Used { checked_in_at } => Some(checked_in_at),
            _ => None,
        }
    }
}

// ============================================================================
// Redemption Receipt
// ============================================================================

/// Proof of a successful check-in, returned exactly once per booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionReceipt {
    /// The booking that was redeemed.
    pub booking_id: BookingId,
    /// Seats admitted.
    pub seats: SeatCount,
    /// When the check-in happened.
    pub checked_in_at: DateTime<Utc>,
}
