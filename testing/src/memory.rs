//! In-memory ride, vehicle and user store.
//!
//! Every operation runs under a single lock, which makes the conditional
//! writes (`reserve_seat`, `update_ride`, `transition_status`) atomic the
//! same way a single SQL statement is.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use carona_core::environment::{RideStore, UpdateOutcome, UserDirectory, VehicleStore};
use carona_core::error::StoreError;
use carona_core::reservation::{CancellationOutcome, ReservationOutcome};
use carona_core::types::{
    DriverSummary, Ride, RideDetails, RideId, RideQuery, RideStatus, User, UserId, Vehicle,
    VehicleId, VehicleSummary,
};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Tables {
    rides: HashMap<RideId, Ride>,
    vehicles: HashMap<VehicleId, Vehicle>,
    users: HashMap<UserId, User>,
}

impl Tables {
    fn details(&self, ride: &Ride) -> Option<RideDetails> {
        let driver = self.users.get(&ride.driver_id)?;
        let vehicle = self.vehicles.get(&ride.vehicle_id)?;
        Some(RideDetails {
            ride: ride.clone(),
            driver: DriverSummary::from(driver),
            vehicle: VehicleSummary::from(vehicle),
        })
    }

    fn collect<F>(&self, mut keep: F) -> Vec<RideDetails>
    where
        F: FnMut(&Ride) -> bool,
    {
        self.rides
            .values()
            .filter(|ride| keep(ride))
            .filter_map(|ride| self.details(ride))
            .collect()
    }
}

fn departure_key(details: &RideDetails) -> (chrono::NaiveDate, chrono::NaiveTime, DateTime<Utc>) {
    let ride = &details.ride;
    (ride.schedule.date, ride.schedule.time, ride.created_at)
}

/// HashMap-backed implementation of every store trait.
///
/// # Example
///
/// ```
/// use carona_testing::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// assert_eq!(store.ride_count(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Database`] until
    /// switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored rides
    #[must_use]
    pub fn ride_count(&self) -> usize {
        self.tables.read().unwrap().rides.len()
    }

    /// Snapshot of a stored ride, bypassing the availability switch
    #[must_use]
    pub fn ride(&self, ride_id: RideId) -> Option<Ride> {
        self.tables.read().unwrap().rides.get(&ride_id).cloned()
    }

    /// Overwrite a stored ride directly (for arranging test state)
    pub fn put_ride(&self, ride: Ride) {
        self.tables.write().unwrap().rides.insert(ride.id, ride);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database("store unavailable".to_string()));
        }
        Ok(())
    }

    fn read<T, F>(&self, f: F) -> BoxFuture<'_, Result<T, StoreError>>
    where
        T: Send + 'static,
        F: FnOnce(&Tables) -> T,
    {
        let result = self
            .check_available()
            .map(|()| f(&*self.tables.read().unwrap()));
        Box::pin(futures::future::ready(result))
    }

    fn write<T, F>(&self, f: F) -> BoxFuture<'_, Result<T, StoreError>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Tables) -> Result<T, StoreError>,
    {
        let result = self
            .check_available()
            .and_then(|()| f(&mut *self.tables.write().unwrap()));
        Box::pin(futures::future::ready(result))
    }
}

impl RideStore for InMemoryStore {
    fn insert_ride<'a>(&'a self, ride: &'a Ride) -> BoxFuture<'a, Result<(), StoreError>> {
        self.write(|tables| {
            if tables.rides.contains_key(&ride.id) {
                return Err(StoreError::Conflict(format!("ride {} already exists", ride.id)));
            }
            tables.rides.insert(ride.id, ride.clone());
            Ok(())
        })
    }

    fn get_ride(&self, ride_id: RideId) -> BoxFuture<'_, Result<Option<Ride>, StoreError>> {
        self.read(move |tables| tables.rides.get(&ride_id).cloned())
    }

    fn get_ride_details(
        &self,
        ride_id: RideId,
    ) -> BoxFuture<'_, Result<Option<RideDetails>, StoreError>> {
        self.read(move |tables| tables.rides.get(&ride_id).and_then(|ride| tables.details(ride)))
    }

    fn search_rides<'a>(
        &'a self,
        query: &'a RideQuery,
    ) -> BoxFuture<'a, Result<Vec<RideDetails>, StoreError>> {
        self.read(move |tables| {
            let mut rides = tables.collect(|ride| query.matches(ride));
            rides.sort_by_key(departure_key);
            rides
        })
    }

    fn rides_by_driver(
        &self,
        driver_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<RideDetails>, StoreError>> {
        self.read(move |tables| {
            let mut rides = tables.collect(|ride| ride.driver_id == driver_id);
            rides.sort_by_key(|details| std::cmp::Reverse(departure_key(details)));
            rides
        })
    }

    fn rides_by_passenger(
        &self,
        passenger_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<RideDetails>, StoreError>> {
        self.read(move |tables| {
            let mut rides = tables.collect(|ride| ride.has_passenger(passenger_id));
            rides.sort_by_key(departure_key);
            rides
        })
    }

    fn reserve_seat(
        &self,
        ride_id: RideId,
        passenger_id: UserId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<ReservationOutcome, StoreError>> {
        self.write(move |tables| {
            let Some(ride) = tables.rides.get_mut(&ride_id) else {
                return Ok(ReservationOutcome::NotFound);
            };
            Ok(match ride.admit_passenger(passenger_id, at) {
                Ok(()) => ReservationOutcome::Reserved(ride.clone()),
                Err(rejection) => ReservationOutcome::Rejected(rejection),
            })
        })
    }

    fn cancel_reservation(
        &self,
        ride_id: RideId,
        passenger_id: UserId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<CancellationOutcome, StoreError>> {
        self.write(move |tables| {
            let Some(ride) = tables.rides.get_mut(&ride_id) else {
                return Ok(CancellationOutcome::NotFound);
            };
            Ok(match ride.release_passenger(passenger_id, at) {
                Ok(true) => CancellationOutcome::Cancelled(ride.clone()),
                Ok(false) => CancellationOutcome::NotReserved(ride.clone()),
                Err(_) => CancellationOutcome::Closed(ride.status),
            })
        })
    }

    fn update_ride<'a>(&'a self, ride: &'a Ride) -> BoxFuture<'a, Result<UpdateOutcome, StoreError>> {
        self.write(|tables| {
            let Some(current) = tables.rides.get_mut(&ride.id) else {
                return Ok(UpdateOutcome::NotFound);
            };
            if current.status != RideStatus::NotStarted {
                return Ok(UpdateOutcome::Closed(current.status));
            }
            if current.seats_taken() > ride.seat_count {
                return Ok(UpdateOutcome::SeatsBelowPassengers {
                    passengers: current.seats_taken(),
                });
            }
            current.vehicle_id = ride.vehicle_id;
            current.origin.clone_from(&ride.origin);
            current.destination.clone_from(&ride.destination);
            current.schedule = ride.schedule;
            current.seat_count = ride.seat_count;
            current.distance_km = ride.distance_km;
            current.price = ride.price;
            current.updated_at = ride.updated_at;
            Ok(UpdateOutcome::Updated(current.clone()))
        })
    }

    fn transition_status(
        &self,
        ride_id: RideId,
        from: RideStatus,
        to: RideStatus,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Option<Ride>, StoreError>> {
        self.write(move |tables| {
            Ok(tables
                .rides
                .get_mut(&ride_id)
                .filter(|ride| ride.status == from)
                .map(|ride| {
                    ride.status = to;
                    ride.updated_at = at;
                    ride.clone()
                }))
        })
    }

    fn delete_ride(
        &self,
        ride_id: RideId,
        driver_id: UserId,
    ) -> BoxFuture<'_, Result<bool, StoreError>> {
        self.write(move |tables| {
            let owned = tables
                .rides
                .get(&ride_id)
                .is_some_and(|ride| ride.driver_id == driver_id);
            if owned {
                tables.rides.remove(&ride_id);
            }
            Ok(owned)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        self.read(|_| ())
    }
}

impl VehicleStore for InMemoryStore {
    fn insert_vehicle<'a>(&'a self, vehicle: &'a Vehicle) -> BoxFuture<'a, Result<(), StoreError>> {
        self.write(|tables| {
            if tables.vehicles.values().any(|v| v.plate == vehicle.plate) {
                return Err(StoreError::Conflict(format!(
                    "plate {} is already registered",
                    vehicle.plate
                )));
            }
            tables.vehicles.insert(vehicle.id, vehicle.clone());
            Ok(())
        })
    }

    fn get_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> BoxFuture<'_, Result<Option<Vehicle>, StoreError>> {
        self.read(move |tables| tables.vehicles.get(&vehicle_id).cloned())
    }

    fn vehicles_by_owner(
        &self,
        owner_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<Vehicle>, StoreError>> {
        self.read(move |tables| {
            let mut vehicles: Vec<Vehicle> = tables
                .vehicles
                .values()
                .filter(|vehicle| vehicle.owner_id == owner_id)
                .cloned()
                .collect();
            vehicles.sort_by_key(|vehicle| (vehicle.created_at, vehicle.plate.clone()));
            vehicles
        })
    }
}

impl UserDirectory for InMemoryStore {
    fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<(), StoreError>> {
        self.write(|tables| {
            if tables.users.values().any(|u| u.email == user.email) {
                return Err(StoreError::Conflict(format!(
                    "email {} is already registered",
                    user.email
                )));
            }
            tables.users.insert(user.id, user.clone());
            Ok(())
        })
    }

    fn get_user(&self, user_id: UserId) -> BoxFuture<'_, Result<Option<User>, StoreError>> {
        self.read(move |tables| tables.users.get(&user_id).cloned())
    }
}
