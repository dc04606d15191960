//! Ticket lifecycle: at-most-once redemption keyed by reference code.
//!
//! Redemption (venue check-in) consumes a ticket's single use. The
//! read-check-transition is one atomic unit per booking, enforced by the
//! store's version check: of N concurrent redemptions of the same code,
//! exactly one commits the `used` transition and the rest observe it and
//! report when the ticket was first used. No seat counts change here.

use crate::environment::Clock;
use crate::retry::{RetryPolicy, retry_with_predicate};
use crate::store::{StoreError, TicketStore, Versioned, Write};
use crate::types::{BookingStatus, RedemptionReceipt, ReferenceCode};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

/// Errors returned by redemption.
///
/// An unknown code is indistinguishable from a forged one: the error carries
/// nothing that would leak whether similar codes exist.
#[derive(Error, Debug)]
pub enum RedeemError {
    /// No booking carries this reference code.
    #[error("invalid reference code")]
    InvalidReference,

    /// The booking behind this code was cancelled.
    #[error("booking has been cancelled")]
    TicketCancelled,

    /// The ticket was already checked in. Carries the original timestamp so
    /// the gate can show when the first use happened.
    #[error("ticket already used (checked in at {checked_in_at})")]
    AlreadyRedeemed {
        /// When the ticket was first checked in.
        checked_in_at: DateTime<Utc>,
    },

    /// Underlying store failure; the transition was rolled back and the
    /// redemption can be retried whole.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RedeemError {
    /// Whether the error is an optimistic-concurrency conflict retried
    /// internally.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_conflict())
    }
}

/// The ticket lifecycle service.
#[derive(Clone)]
pub struct TicketLifecycle {
    store: Arc<dyn TicketStore>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl TicketLifecycle {
    /// Creates a lifecycle service with the default conflict-retry policy.
    #[must_use]
    pub fn new(store: Arc<dyn TicketStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_retry(store, clock, RetryPolicy::default())
    }

    /// Creates a lifecycle service with an explicit conflict-retry policy.
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

    /// Redeems a ticket by reference code, exactly once.
    ///
    /// A concurrent redeemer that loses the version race re-reads the
    /// booking, finds it `used`, and gets [`RedeemError::AlreadyRedeemed`]
    /// with the winning check-in time — never a second receipt.
    ///
    /// # Errors
    ///
    /// - [`RedeemError::InvalidReference`]: unknown code.
    /// - [`RedeemError::TicketCancelled`]: the booking was cancelled.
    /// - [`RedeemError::AlreadyRedeemed`]: the single use is spent.
    /// - [`RedeemError::Store`]: backend failure; the ticket stays
    ///   unredeemed.
    #[instrument(skip(self, reference))]
    pub async fn redeem(&self, reference: &ReferenceCode) -> Result<RedemptionReceipt, RedeemError> {
        retry_with_predicate(
            &self.retry,
            || self.try_redeem(reference),
            RedeemError::is_conflict,
        )
        .await
    }

    async fn try_redeem(&self, reference: &ReferenceCode) -> Result<RedemptionReceipt, RedeemError> {
        let Some(Versioned {
            record: mut booking,
            version,
        }) = self.store.find_by_reference(reference).await?
        else {
            return Err(RedeemError::InvalidReference);
        };

        match booking.status {
            BookingStatus::Cancelled => return Err(RedeemError::TicketCancelled),
            BookingStatus::Used { checked_in_at } => {
                return Err(RedeemError::AlreadyRedeemed { checked_in_at });
            }
            BookingStatus::Confirmed => {}
        }

        let checked_in_at = self.clock.now();
        booking.status = BookingStatus::Used { checked_in_at };

        self.store
            .commit(vec![Write::UpdateBooking {
                booking: booking.clone(),
                expected: version,
            }])
            .await?;

        info!(booking_id = %booking.id, seats = %booking.seats, "ticket checked in");
        Ok(RedemptionReceipt {
            booking_id: booking.id,
            seats: booking.seats,
            checked_in_at,
        })
    }
}
