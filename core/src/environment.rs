//! Environment dependencies injected into the ledger and lifecycle services.
//!
//! The only ambient capability this core needs from the outside world is a
//! clock; everything else arrives through the [`store`](crate::store)
//! abstraction. Keeping time behind a trait keeps check-in timestamps
//! deterministic under test.

use chrono::{DateTime, Utc};

/// Provides the current time.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
