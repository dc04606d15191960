//! # Boxoffice Testing
//!
//! Testing utilities for the boxoffice ticketing system:
//!
//! - Deterministic [`mocks::FixedClock`]
//! - Builders for seeded events and bookings

use boxoffice_core::environment::Clock;
use boxoffice_core::types::{EventId, EventRecord, Money};
use chrono::{DateTime, Utc};

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests.
    ///
    /// Always returns the same time, making check-in timestamps
    /// reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boxoffice_testing::mocks::FixedClock;
    /// use boxoffice_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC).
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which should never
    /// happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test data builders.
pub mod helpers {
    use super::{EventId, EventRecord, Money};

    /// An event with `total_seats` capacity at `price_cents` per seat, all
    /// seats available.
    #[must_use]
    pub fn event_with_seats(total_seats: u32, price_cents: u64) -> EventRecord {
        EventRecord::new(EventId::new(), total_seats, Money::from_cents(price_cents))
    }
}

// Re-export commonly used items
pub use helpers::event_with_seats;
pub use mocks::{FixedClock, test_clock};
