//! # Boxoffice Core
//!
//! Seat-inventory ledger and ticket lifecycle for an event-ticketing
//! system.
//!
//! Two services over one abstract store:
//!
//! - [`SeatLedger`] — owns the `0 <= available_seats <= total_seats`
//!   invariant per event and performs the atomic seat debit/credit bundled
//!   with booking creation and cancellation.
//! - [`TicketLifecycle`] — owns the booking state machine
//!   (`confirmed → cancelled | used`) and the exactly-once redemption
//!   protocol keyed by an opaque reference code.
//!
//! Concurrency is optimistic: every stored document is versioned, commits
//! assert the versions they were computed from, and the services re-read
//! and retry on conflict with bounded backoff ([`retry`]). Operations on
//! disjoint events or bookings never contend.
//!
//! Everything around these two services — HTTP, identity, event-metadata
//! CRUD, QR rendering — lives with external collaborators. They reach this
//! core through [`store::TicketStore`] implementations and consume
//! [`types::Booking`] records.

pub mod environment;
pub mod ledger;
pub mod lifecycle;
pub mod retry;
pub mod store;
pub mod types;

pub use environment::{Clock, SystemClock};
pub use ledger::{LedgerError, SeatLedger};
pub use lifecycle::{RedeemError, TicketLifecycle};
pub use retry::RetryPolicy;
pub use store::{StoreError, TicketStore, Version, Versioned, Write};
pub use types::{
    Booking, BookingId, BookingStatus, CustomerId, EventId, EventRecord, Money,
    RedemptionReceipt, ReferenceCode, SeatCount,
};
