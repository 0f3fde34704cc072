//! Seat reservation rules.
//!
//! A reservation appends the passenger to `passenger_ids` only when all of
//! these hold at the moment of the write:
//!
//! ```text
//! status == not_started
//! passenger != driver
//! passenger ∉ passenger_ids
//! len(passenger_ids) < seat_count
//! ```
//!
//! Stores must evaluate the whole condition and the append as one atomic
//! step (a single conditional `UPDATE` in `PostgreSQL`, a single critical
//! section in memory). [`Ride::admit_passenger`] is the reference
//! implementation of that step.

use crate::error::RideError;
use crate::types::{Ride, RideId, RideStatus, UserId};
use chrono::{DateTime, Utc};

/// Why a reservation was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReservationRejection {
    /// The ride is no longer open for reservations
    Closed(RideStatus),
    /// The driver tried to book their own ride
    OwnRide,
    /// The passenger already holds a seat
    AlreadyReserved,
    /// No seats left
    Full {
        /// Capacity of the ride
        seat_count: u32,
    },
}

impl ReservationRejection {
    /// Map to the public error for `ride_id`/`passenger`.
    #[must_use]
    pub fn into_error(self, ride_id: RideId, passenger: UserId) -> RideError {
        match self {
            Self::Closed(status) => RideError::RideClosed { ride_id, status },
            Self::OwnRide => {
                RideError::Forbidden("drivers cannot reserve seats on their own ride".to_string())
            }
            Self::AlreadyReserved => RideError::AlreadyReserved {
                ride_id,
                user_id: passenger,
            },
            Self::Full { seat_count } => RideError::Full {
                ride_id,
                seat_count,
            },
        }
    }
}

/// Result of an atomic reservation attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum ReservationOutcome {
    /// Seat claimed; the updated ride
    Reserved(Ride),
    /// Ride exists but the condition failed
    Rejected(ReservationRejection),
    /// No ride with that ID
    NotFound,
}

/// Result of an atomic cancellation attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum CancellationOutcome {
    /// Passenger removed; the updated ride
    Cancelled(Ride),
    /// Passenger held no seat; the unchanged ride
    NotReserved(Ride),
    /// The ride is completed
    Closed(RideStatus),
    /// No ride with that ID
    NotFound,
}

impl Ride {
    /// Check the reservation condition without mutating.
    ///
    /// # Errors
    ///
    /// Returns the first failing condition, checked in the order
    /// closed → own ride → duplicate → full.
    pub fn check_reservation(&self, passenger: UserId) -> Result<(), ReservationRejection> {
        if self.status != RideStatus::NotStarted {
            return Err(ReservationRejection::Closed(self.status));
        }
        if self.is_driven_by(passenger) {
            return Err(ReservationRejection::OwnRide);
        }
        if self.has_passenger(passenger) {
            return Err(ReservationRejection::AlreadyReserved);
        }
        if self.is_full() {
            return Err(ReservationRejection::Full {
                seat_count: self.seat_count,
            });
        }
        Ok(())
    }

    /// Claim a seat for `passenger` if the reservation condition holds.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason; the ride is left untouched.
    pub fn admit_passenger(
        &mut self,
        passenger: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), ReservationRejection> {
        self.check_reservation(passenger)?;
        self.passenger_ids.push(passenger);
        self.updated_at = at;
        Ok(())
    }

    /// Remove `passenger` if present. Returns whether a seat was released.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationRejection::Closed`] for completed rides.
    pub fn release_passenger(
        &mut self,
        passenger: UserId,
        at: DateTime<Utc>,
    ) -> Result<bool, ReservationRejection> {
        if self.status.is_terminal() {
            return Err(ReservationRejection::Closed(self.status));
        }
        let before = self.passenger_ids.len();
        self.passenger_ids.retain(|id| *id != passenger);
        let released = self.passenger_ids.len() != before;
        if released {
            self.updated_at = at;
        }
        Ok(released)
    }
}
