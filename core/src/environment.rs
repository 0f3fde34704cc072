//! Dependency injection traits.
//!
//! Every external dependency of the ride services sits behind a trait so that
//! production wiring (`PostgreSQL`, HTTP distance API, system clock) and test
//! wiring (in-memory store, stub distances, fixed clock) are interchangeable.
//!
//! Trait methods return [`BoxFuture`] to stay object-safe; services hold
//! `Arc<dyn Trait>`.

use crate::error::{DistanceError, StoreError};
use crate::pricing::PricingPolicy;
use crate::reservation::{CancellationOutcome, ReservationOutcome};
use crate::types::{
    Ride, RideDetails, RideId, RideQuery, RideStatus, User, UserId, Vehicle, VehicleId,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Clock trait - abstracts time operations for testability
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by [`Utc::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Road distance between two free-form place names.
pub trait DistanceService: Send + Sync {
    /// Driving distance from `origin` to `destination` in kilometers.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError`] when the lookup fails or no route exists.
    fn distance_km<'a>(
        &'a self,
        origin: &'a str,
        destination: &'a str,
    ) -> BoxFuture<'a, Result<f64, DistanceError>>;
}

/// Result of a conditional ride update.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOutcome {
    /// Ride updated; passengers preserved
    Updated(Ride),
    /// No ride with that ID
    NotFound,
    /// Ride is no longer `not_started`
    Closed(RideStatus),
    /// More passengers hold seats than the new seat count allows
    SeatsBelowPassengers {
        /// Passengers at the time of the write
        passengers: u32,
    },
}

/// Ride persistence.
///
/// `reserve_seat`, `cancel_reservation`, `update_ride` and
/// `transition_status` must each check their condition and write in one
/// atomic step; concurrent callers never observe or produce a ride with more
/// passengers than seats, or a duplicated passenger.
pub trait RideStore: Send + Sync {
    /// Persist a new ride.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn insert_ride<'a>(&'a self, ride: &'a Ride) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Load a ride.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn get_ride(&self, ride_id: RideId) -> BoxFuture<'_, Result<Option<Ride>, StoreError>>;

    /// Load a ride with driver and vehicle details.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn get_ride_details(
        &self,
        ride_id: RideId,
    ) -> BoxFuture<'_, Result<Option<RideDetails>, StoreError>>;

    /// Open rides matching `query`, earliest departure first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn search_rides<'a>(
        &'a self,
        query: &'a RideQuery,
    ) -> BoxFuture<'a, Result<Vec<RideDetails>, StoreError>>;

    /// Rides published by `driver_id`, latest departure first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn rides_by_driver(
        &self,
        driver_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<RideDetails>, StoreError>>;

    /// Rides on which `passenger_id` holds a seat, earliest departure first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn rides_by_passenger(
        &self,
        passenger_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<RideDetails>, StoreError>>;

    /// Atomically claim a seat.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure. Business refusals are
    /// reported through [`ReservationOutcome`].
    fn reserve_seat(
        &self,
        ride_id: RideId,
        passenger_id: UserId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<ReservationOutcome, StoreError>>;

    /// Atomically release a seat.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn cancel_reservation(
        &self,
        ride_id: RideId,
        passenger_id: UserId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<CancellationOutcome, StoreError>>;

    /// Overwrite the editable fields of `ride` (route, schedule, seats,
    /// vehicle, distance, price, `updated_at`) while it is still
    /// `not_started` and its current passengers fit in the new seat count.
    ///
    /// `passenger_ids` and `status` are never written by this call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn update_ride<'a>(&'a self, ride: &'a Ride) -> BoxFuture<'a, Result<UpdateOutcome, StoreError>>;

    /// Move `ride_id` from `from` to `to` if it is currently in `from`.
    ///
    /// Returns the updated ride, or `None` if the ride is missing or not in
    /// `from`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn transition_status(
        &self,
        ride_id: RideId,
        from: RideStatus,
        to: RideStatus,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Option<Ride>, StoreError>>;

    /// Delete `ride_id` if it is driven by `driver_id`. Returns whether a row
    /// was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn delete_ride(
        &self,
        ride_id: RideId,
        driver_id: UserId,
    ) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Cheap connectivity probe for readiness checks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend is unreachable.
    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Vehicle persistence.
pub trait VehicleStore: Send + Sync {
    /// Persist a new vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the plate is already registered.
    fn insert_vehicle<'a>(&'a self, vehicle: &'a Vehicle) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Load a vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn get_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> BoxFuture<'_, Result<Option<Vehicle>, StoreError>>;

    /// Vehicles owned by `owner_id`, oldest registration first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn vehicles_by_owner(
        &self,
        owner_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<Vehicle>, StoreError>>;
}

/// User persistence.
pub trait UserDirectory: Send + Sync {
    /// Persist a new user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the email is already registered.
    fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Load a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    fn get_user(&self, user_id: UserId) -> BoxFuture<'_, Result<Option<User>, StoreError>>;
}

/// Everything the ride and directory services depend on.
#[derive(Clone)]
pub struct RideEnvironment {
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Ride persistence
    pub rides: Arc<dyn RideStore>,
    /// Vehicle persistence
    pub vehicles: Arc<dyn VehicleStore>,
    /// User persistence
    pub users: Arc<dyn UserDirectory>,
    /// Route distance lookups
    pub distance: Arc<dyn DistanceService>,
    /// Seat pricing
    pub pricing: PricingPolicy,
    /// Zone in which ride dates and times are interpreted
    pub timezone: Tz,
}

impl RideEnvironment {
    /// Creates a new `RideEnvironment` with default pricing and the
    /// `America/Sao_Paulo` time zone.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        rides: Arc<dyn RideStore>,
        vehicles: Arc<dyn VehicleStore>,
        users: Arc<dyn UserDirectory>,
        distance: Arc<dyn DistanceService>,
    ) -> Self {
        Self {
            clock,
            rides,
            vehicles,
            users,
            distance,
            pricing: PricingPolicy::default(),
            timezone: chrono_tz::America::Sao_Paulo,
        }
    }

    /// Replaces the pricing policy.
    #[must_use]
    pub fn with_pricing(mut self, pricing: PricingPolicy) -> Self {
        self.pricing = pricing;
        self
    }

    /// Replaces the time zone.
    #[must_use]
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }
}
