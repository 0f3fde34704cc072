//! # Carona Testing
//!
//! Testing utilities and helpers for Carona.
//!
//! This crate provides:
//! - [`InMemoryStore`]: every store trait behind one lock
//! - [`StubDistanceService`]: scripted route distances
//! - [`FixedClock`]: deterministic time
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - [`TestWorld`]: all of the above wired into a `RideEnvironment`
//!
//! ## Example
//!
//! ```ignore
//! use carona_testing::{TestWorld, as_user};
//!
//! #[tokio::test]
//! async fn test_booking() {
//!     let world = TestWorld::new();
//!     let (driver, _) = world.driver("Ana").await;
//!     let passenger = world.user("Bruno").await;
//!     let ride = world.publish(&driver, 2).await;
//!
//!     let booked = world.rides().reserve_seat(&as_user(&passenger), ride.id).await.unwrap();
//!     assert_eq!(booked.passenger_ids, vec![passenger.id]);
//! }
//! ```

use carona_core::environment::Clock;
use chrono::{DateTime, Utc};

pub mod distance;
pub mod fixtures;
pub mod memory;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use carona_testing::mocks::FixedClock;
    /// use carona_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
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

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
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

/// Install a compact `tracing` subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use distance::StubDistanceService;
pub use fixtures::{DEFAULT_ROUTE_KM, TestWorld, as_user, draft, world_time};
pub use memory::InMemoryStore;
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }
}
