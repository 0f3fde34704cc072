//! Ride operations.
//!
//! [`RideService`] is the imperative shell around [`RideReducer`]: it loads
//! rides, feeds commands to the reducer, executes the returned effects
//! (distance lookups and conditional store writes) and maps store outcomes
//! to [`RideError`]s. Seat reservation bypasses the reducer and relies on
//! the store's atomic `reserve_seat`.

use crate::context::ActorContext;
use crate::environment::{RideEnvironment, UpdateOutcome};
use crate::error::{Result, RideError};
use crate::lifecycle::{
    LifecycleEnvironment, RideAction, RideEffect, RideReducer, RideState, RideWrite,
};
use crate::reducer::Reducer;
use crate::reservation::{CancellationOutcome, ReservationOutcome, ReservationRejection};
use crate::types::{
    DriverSummary, Ride, RideDetails, RideId, RideQuery, User, UserId, VehicleSummary,
};
use crate::validation::{RideChanges, RideDraft};
use std::collections::VecDeque;

/// Publishes, searches, books and manages rides.
#[derive(Clone)]
pub struct RideService {
    env: RideEnvironment,
    reducer: RideReducer,
}

impl RideService {
    /// Creates a new `RideService`
    #[must_use]
    pub const fn new(env: RideEnvironment) -> Self {
        Self {
            env,
            reducer: RideReducer::new(),
        }
    }

    /// Injected dependencies.
    #[must_use]
    pub const fn environment(&self) -> &RideEnvironment {
        &self.env
    }

    /// Publish a ride for the calling driver.
    ///
    /// Validates the draft, picks the vehicle, looks up the route distance,
    /// prices the seat and stores the ride as `not_started` with no
    /// passengers. Nothing is stored if any step fails.
    ///
    /// # Errors
    ///
    /// - [`RideError::NotFound`] if the driver is not registered
    /// - [`RideError::Validation`] / [`RideError::VehicleSelection`] for bad input
    /// - [`RideError::DistanceUnavailable`] if the route lookup fails
    /// - [`RideError::Store`] on storage failure
    #[tracing::instrument(
        skip_all,
        fields(driver_id = %ctx.user_id, correlation_id = %ctx.correlation_id)
    )]
    pub async fn create_ride(&self, ctx: &ActorContext, draft: RideDraft) -> Result<RideDetails> {
        let driver = self.require_user(ctx.user_id).await?;
        let fleet = self.env.vehicles.vehicles_by_owner(driver.id).await?;

        let mut state = RideState::new(RideId::new());
        let action = RideAction::PublishRide {
            driver_id: driver.id,
            draft,
            fleet: fleet.clone(),
        };
        let ride = self
            .dispatch(&mut state, action)
            .await?
            .ok_or_else(|| RideError::ride_not_found(state.ride_id))?;

        let vehicle = fleet
            .iter()
            .find(|vehicle| vehicle.id == ride.vehicle_id)
            .ok_or_else(|| RideError::NotFound {
                resource: "Vehicle",
                id: ride.vehicle_id.to_string(),
            })?;

        metrics::counter!("rides.created").increment(1);
        tracing::info!(
            ride_id = %ride.id,
            distance_km = ride.distance_km,
            price = %ride.price,
            "Ride published"
        );

        Ok(RideDetails {
            driver: DriverSummary::from(&driver),
            vehicle: VehicleSummary::from(vehicle),
            ride,
        })
    }

    /// Open rides matching `query`, earliest departure first.
    ///
    /// Blank filters are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RideError::Store`] on storage failure.
    pub async fn search_rides(&self, query: &RideQuery) -> Result<Vec<RideDetails>> {
        let normalized = RideQuery {
            origin: normalize_filter(query.origin.as_deref()),
            destination: normalize_filter(query.destination.as_deref()),
            date: query.date,
        };
        let rides = self.env.rides.search_rides(&normalized).await?;
        tracing::debug!(results = rides.len(), "Ride search");
        Ok(rides)
    }

    /// A single ride with driver and vehicle details.
    ///
    /// # Errors
    ///
    /// Returns [`RideError::NotFound`] for unknown rides.
    pub async fn get_ride(&self, ride_id: RideId) -> Result<RideDetails> {
        self.env
            .rides
            .get_ride_details(ride_id)
            .await?
            .ok_or_else(|| RideError::ride_not_found(ride_id))
    }

    /// Rides the caller publishes as a driver, latest departure first.
    ///
    /// # Errors
    ///
    /// Returns [`RideError::Store`] on storage failure.
    pub async fn list_driver_rides(&self, ctx: &ActorContext) -> Result<Vec<RideDetails>> {
        Ok(self.env.rides.rides_by_driver(ctx.user_id).await?)
    }

    /// Rides on which the caller holds a seat, earliest departure first.
    ///
    /// # Errors
    ///
    /// Returns [`RideError::Store`] on storage failure.
    pub async fn list_reserved_rides(&self, ctx: &ActorContext) -> Result<Vec<RideDetails>> {
        Ok(self.env.rides.rides_by_passenger(ctx.user_id).await?)
    }

    /// Claim a seat on `ride_id` for the caller.
    ///
    /// The store checks status, ownership, duplicates and capacity and
    /// appends the passenger in one atomic step, so concurrent callers racing
    /// for the last seat see exactly one success.
    ///
    /// # Errors
    ///
    /// - [`RideError::NotFound`] for unknown rides or unregistered callers
    /// - [`RideError::Forbidden`] when the driver tries to book their own ride
    /// - [`RideError::AlreadyReserved`], [`RideError::Full`], [`RideError::RideClosed`]
    #[tracing::instrument(
        skip_all,
        fields(ride_id = %ride_id, passenger_id = %ctx.user_id, correlation_id = %ctx.correlation_id)
    )]
    pub async fn reserve_seat(&self, ctx: &ActorContext, ride_id: RideId) -> Result<Ride> {
        let passenger = self.require_user(ctx.user_id).await?;
        let at = self.env.clock.now();

        match self.env.rides.reserve_seat(ride_id, passenger.id, at).await? {
            ReservationOutcome::Reserved(ride) => {
                metrics::counter!("rides.reservations").increment(1);
                tracing::info!(
                    seats_taken = ride.seats_taken(),
                    seat_count = ride.seat_count,
                    "Seat reserved"
                );
                Ok(ride)
            },
            ReservationOutcome::Rejected(rejection) => {
                metrics::counter!("rides.reservations.rejected", "reason" => rejection_label(rejection))
                    .increment(1);
                tracing::info!(reason = rejection_label(rejection), "Reservation rejected");
                Err(rejection.into_error(ride_id, passenger.id))
            },
            ReservationOutcome::NotFound => Err(RideError::ride_not_found(ride_id)),
        }
    }

    /// Give up the caller's seat on `ride_id`.
    ///
    /// Cancelling a seat the caller does not hold is a no-op that returns
    /// the unchanged ride.
    ///
    /// # Errors
    ///
    /// - [`RideError::NotFound`] for unknown rides
    /// - [`RideError::RideClosed`] for completed rides
    #[tracing::instrument(
        skip_all,
        fields(ride_id = %ride_id, passenger_id = %ctx.user_id, correlation_id = %ctx.correlation_id)
    )]
    pub async fn cancel_reservation(&self, ctx: &ActorContext, ride_id: RideId) -> Result<Ride> {
        let at = self.env.clock.now();

        match self.env.rides.cancel_reservation(ride_id, ctx.user_id, at).await? {
            CancellationOutcome::Cancelled(ride) => {
                metrics::counter!("rides.reservations.cancelled").increment(1);
                tracing::info!("Reservation cancelled");
                Ok(ride)
            },
            CancellationOutcome::NotReserved(ride) => {
                tracing::debug!("No reservation to cancel");
                Ok(ride)
            },
            CancellationOutcome::Closed(status) => Err(RideError::RideClosed { ride_id, status }),
            CancellationOutcome::NotFound => Err(RideError::ride_not_found(ride_id)),
        }
    }

    /// Edit a ride the caller drives. Only allowed while `not_started`.
    ///
    /// Distance and price are recomputed when origin, destination or seat
    /// count change. Passengers are kept.
    ///
    /// # Errors
    ///
    /// - [`RideError::NotFound`] / [`RideError::Forbidden`] / [`RideError::RideClosed`]
    /// - [`RideError::Validation`] / [`RideError::VehicleSelection`]
    /// - [`RideError::SeatsBelowPassengers`] when seats would drop below the
    ///   current passenger count
    /// - [`RideError::DistanceUnavailable`]
    #[tracing::instrument(
        skip_all,
        fields(ride_id = %ride_id, user_id = %ctx.user_id, correlation_id = %ctx.correlation_id)
    )]
    pub async fn update_ride(
        &self,
        ctx: &ActorContext,
        ride_id: RideId,
        changes: RideChanges,
    ) -> Result<Ride> {
        let mut state = self.load(ride_id).await?;
        let fleet = if changes.vehicle_id.is_some() {
            self.env.vehicles.vehicles_by_owner(ctx.user_id).await?
        } else {
            Vec::new()
        };

        let action = RideAction::ReviseRide {
            actor: ctx.user_id,
            changes,
            fleet,
        };
        let ride = self
            .dispatch(&mut state, action)
            .await?
            .ok_or_else(|| RideError::ride_not_found(ride_id))?;

        tracing::info!("Ride updated");
        Ok(ride)
    }

    /// Delete a ride the caller drives, in any status.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] / [`RideError::Forbidden`]
    #[tracing::instrument(
        skip_all,
        fields(ride_id = %ride_id, user_id = %ctx.user_id, correlation_id = %ctx.correlation_id)
    )]
    pub async fn delete_ride(&self, ctx: &ActorContext, ride_id: RideId) -> Result<()> {
        let mut state = self.load(ride_id).await?;
        self.dispatch(&mut state, RideAction::DeleteRide { actor: ctx.user_id })
            .await?;
        tracing::info!("Ride deleted");
        Ok(())
    }

    /// Move a ride the caller drives from `not_started` to `in_progress`.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] / [`RideError::Forbidden`] /
    /// [`RideError::InvalidTransition`]
    #[tracing::instrument(
        skip_all,
        fields(ride_id = %ride_id, user_id = %ctx.user_id, correlation_id = %ctx.correlation_id)
    )]
    pub async fn start_ride(&self, ctx: &ActorContext, ride_id: RideId) -> Result<Ride> {
        self.change_status(ride_id, RideAction::StartRide { actor: ctx.user_id })
            .await
    }

    /// Move a ride the caller drives from `in_progress` to `completed`.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] / [`RideError::Forbidden`] /
    /// [`RideError::InvalidTransition`]
    #[tracing::instrument(
        skip_all,
        fields(ride_id = %ride_id, user_id = %ctx.user_id, correlation_id = %ctx.correlation_id)
    )]
    pub async fn complete_ride(&self, ctx: &ActorContext, ride_id: RideId) -> Result<Ride> {
        self.change_status(ride_id, RideAction::CompleteRide { actor: ctx.user_id })
            .await
    }

    async fn change_status(&self, ride_id: RideId, action: RideAction) -> Result<Ride> {
        let mut state = self.load(ride_id).await?;
        let ride = self
            .dispatch(&mut state, action)
            .await?
            .ok_or_else(|| RideError::ride_not_found(ride_id))?;
        tracing::info!(status = %ride.status, "Ride status changed");
        Ok(ride)
    }

    async fn require_user(&self, user_id: UserId) -> Result<User> {
        self.env
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| RideError::user_not_found(user_id))
    }

    async fn load(&self, ride_id: RideId) -> Result<RideState> {
        self.env
            .rides
            .get_ride(ride_id)
            .await?
            .map(RideState::loaded)
            .ok_or_else(|| RideError::ride_not_found(ride_id))
    }

    /// Run `action` through the reducer and execute its effects until none
    /// remain. Returns the ride as written by the last store write.
    async fn dispatch(&self, state: &mut RideState, action: RideAction) -> Result<Option<Ride>> {
        let env = LifecycleEnvironment::from(&self.env);
        let mut effects = self.reduce(state, action, &env)?;
        let mut written = None;

        while let Some(effect) = effects.pop_front() {
            match effect {
                RideEffect::QuoteRoute {
                    origin,
                    destination,
                } => {
                    let distance_km = self.lookup_distance(&origin, &destination).await?;
                    effects.extend(self.reduce(
                        state,
                        RideAction::RouteQuoted { distance_km },
                        &env,
                    )?);
                },
                RideEffect::Persist(write) => {
                    written = self.persist(write).await?;
                },
            }
        }

        Ok(written)
    }

    fn reduce(
        &self,
        state: &mut RideState,
        action: RideAction,
        env: &LifecycleEnvironment,
    ) -> Result<VecDeque<RideEffect>> {
        let effects = self.reducer.reduce(state, action, env);
        match state.last_error.take() {
            Some(error) => Err(error),
            None => Ok(effects.into()),
        }
    }

    async fn lookup_distance(&self, origin: &str, destination: &str) -> Result<f64> {
        match self.env.distance.distance_km(origin, destination).await {
            Ok(distance_km) => {
                metrics::counter!("distance.lookups", "outcome" => "ok").increment(1);
                tracing::debug!(origin, destination, distance_km, "Route distance resolved");
                Ok(distance_km)
            },
            Err(error) => {
                metrics::counter!("distance.lookups", "outcome" => "error").increment(1);
                tracing::warn!(origin, destination, error = %error, "Route distance lookup failed");
                Err(RideError::DistanceUnavailable(error))
            },
        }
    }

    async fn persist(&self, write: RideWrite) -> Result<Option<Ride>> {
        match write {
            RideWrite::Insert(ride) => {
                self.env.rides.insert_ride(&ride).await?;
                Ok(Some(ride))
            },
            RideWrite::Update(ride) => match self.env.rides.update_ride(&ride).await? {
                UpdateOutcome::Updated(updated) => Ok(Some(updated)),
                UpdateOutcome::NotFound => Err(RideError::ride_not_found(ride.id)),
                UpdateOutcome::Closed(status) => Err(RideError::RideClosed {
                    ride_id: ride.id,
                    status,
                }),
                UpdateOutcome::SeatsBelowPassengers { passengers } => {
                    Err(RideError::SeatsBelowPassengers {
                        ride_id: ride.id,
                        passengers,
                        requested: ride.seat_count,
                    })
                },
            },
            RideWrite::Transition {
                ride_id,
                from,
                to,
                at,
            } => {
                if let Some(ride) = self.env.rides.transition_status(ride_id, from, to, at).await? {
                    return Ok(Some(ride));
                }
                // Lost a race: report the status the ride actually has now.
                match self.env.rides.get_ride(ride_id).await? {
                    Some(current) => Err(RideError::InvalidTransition {
                        ride_id,
                        from: current.status,
                        to,
                    }),
                    None => Err(RideError::ride_not_found(ride_id)),
                }
            },
            RideWrite::Delete { ride_id, driver_id } => {
                if self.env.rides.delete_ride(ride_id, driver_id).await? {
                    Ok(None)
                } else {
                    Err(RideError::ride_not_found(ride_id))
                }
            },
        }
    }
}

const fn rejection_label(rejection: ReservationRejection) -> &'static str {
    match rejection {
        ReservationRejection::Closed(_) => "closed",
        ReservationRejection::OwnRide => "own_ride",
        ReservationRejection::AlreadyReserved => "already_reserved",
        ReservationRejection::Full { .. } => "full",
    }
}

fn normalize_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
