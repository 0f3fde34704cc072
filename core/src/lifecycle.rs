//! Ride lifecycle reducer.
//!
//! Publishing, editing, starting, completing and deleting a ride are decided
//! here as a pure function of the current ride, the command and the
//! injected clock/pricing/time zone. The reducer never performs I/O: it
//! returns [`RideEffect`]s describing the route lookup and the conditional
//! write to perform, and [`crate::service::RideService`] executes them.
//!
//! Seat reservations do not go through the reducer; their check-and-write
//! must happen inside the store (see [`crate::reservation`]).

use crate::environment::{Clock, RideEnvironment};
use crate::error::RideError;
use crate::pricing::PricingPolicy;
use crate::reducer::Reducer;
use crate::types::{Price, Ride, RideId, RideStatus, UserId, Vehicle, VehicleId};
use crate::validation::{
    PlannedRevision, RideChanges, RideDraft, ValidatedRide, plan_revision, select_vehicle,
    validate_new_ride,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

// ============================================================================
// State
// ============================================================================

/// The ride a command operates on, plus in-flight bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct RideState {
    /// Ride the commands target
    pub ride_id: RideId,
    /// Current ride, `None` before publishing and after deletion
    pub ride: Option<Ride>,
    /// Validated input waiting for a route quote
    pub pending: Option<PendingQuote>,
    /// Why the last command was rejected
    pub last_error: Option<RideError>,
}

impl RideState {
    /// State for a ride that does not exist yet.
    #[must_use]
    pub const fn new(ride_id: RideId) -> Self {
        Self {
            ride_id,
            ride: None,
            pending: None,
            last_error: None,
        }
    }

    /// State for an existing ride.
    #[must_use]
    pub fn loaded(ride: Ride) -> Self {
        Self {
            ride_id: ride.id,
            ride: Some(ride),
            pending: None,
            last_error: None,
        }
    }
}

/// Input that passed validation and now needs distance and price.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingQuote {
    /// A new ride
    Publish {
        /// Publishing driver
        driver_id: UserId,
        /// Selected vehicle
        vehicle_id: VehicleId,
        /// Validated draft
        ride: ValidatedRide,
    },
    /// An edit that changes route or seats
    Revise {
        /// Merged values
        plan: PlannedRevision,
        /// Resulting vehicle
        vehicle_id: VehicleId,
    },
}

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the ride lifecycle
#[derive(Clone, Debug, PartialEq)]
pub enum RideAction {
    // Commands
    /// Publish a new ride
    PublishRide {
        /// Publishing driver
        driver_id: UserId,
        /// Raw input
        draft: RideDraft,
        /// Vehicles the driver owns
        fleet: Vec<Vehicle>,
    },

    /// Edit an existing ride
    ReviseRide {
        /// Requesting user
        actor: UserId,
        /// Raw partial edit
        changes: RideChanges,
        /// Vehicles the actor owns (only needed when changing vehicle)
        fleet: Vec<Vehicle>,
    },

    /// Move `not_started → in_progress`
    StartRide {
        /// Requesting user
        actor: UserId,
    },

    /// Move `in_progress → completed`
    CompleteRide {
        /// Requesting user
        actor: UserId,
    },

    /// Remove the ride
    DeleteRide {
        /// Requesting user
        actor: UserId,
    },

    /// Route distance for the pending quote arrived
    RouteQuoted {
        /// Driving distance in kilometers
        distance_km: f64,
    },

    // Events
    /// Validation passed; a route lookup is needed
    QuoteRequested {
        /// What is being quoted
        pending: PendingQuote,
    },

    /// A new ride was built
    RidePublished {
        /// The ride
        ride: Ride,
    },

    /// Ride fields were edited
    RideRevised {
        /// The edited ride
        ride: Ride,
    },

    /// Ride status moved forward
    StatusChanged {
        /// Previous status
        from: RideStatus,
        /// New status
        to: RideStatus,
        /// When
        at: DateTime<Utc>,
    },

    /// Ride was deleted
    RideDeleted {
        /// Deleted ride
        ride_id: RideId,
    },

    /// Command was refused
    CommandRejected {
        /// Reason
        error: RideError,
    },
}

// ============================================================================
// Effects
// ============================================================================

/// Side effects requested by the reducer.
#[derive(Clone, Debug, PartialEq)]
pub enum RideEffect {
    /// Look up the driving distance and feed back [`RideAction::RouteQuoted`]
    QuoteRoute {
        /// Departure place
        origin: String,
        /// Arrival place
        destination: String,
    },
    /// Apply a conditional write to the ride store
    Persist(RideWrite),
}

/// Conditional writes, one per store operation.
#[derive(Clone, Debug, PartialEq)]
pub enum RideWrite {
    /// Insert a new ride
    Insert(Ride),
    /// Overwrite editable fields if still `not_started` and passengers fit
    Update(Ride),
    /// Compare-and-set the status
    Transition {
        /// Ride
        ride_id: RideId,
        /// Expected current status
        from: RideStatus,
        /// New status
        to: RideStatus,
        /// When
        at: DateTime<Utc>,
    },
    /// Delete if driven by `driver_id`
    Delete {
        /// Ride
        ride_id: RideId,
        /// Driver
        driver_id: UserId,
    },
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the lifecycle reducer.
#[derive(Clone)]
pub struct LifecycleEnvironment {
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Seat pricing
    pub pricing: PricingPolicy,
    /// Zone in which schedules are interpreted
    pub timezone: Tz,
}

impl LifecycleEnvironment {
    /// Creates a new `LifecycleEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, pricing: PricingPolicy, timezone: Tz) -> Self {
        Self {
            clock,
            pricing,
            timezone,
        }
    }
}

impl From<&RideEnvironment> for LifecycleEnvironment {
    fn from(env: &RideEnvironment) -> Self {
        Self::new(Arc::clone(&env.clock), env.pricing, env.timezone)
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the ride lifecycle
#[derive(Clone, Copy, Debug, Default)]
pub struct RideReducer;

impl RideReducer {
    /// Creates a new `RideReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The loaded ride, if `actor` drives it.
    fn validate_driver(state: &RideState, actor: UserId) -> Result<&Ride, RideError> {
        let ride = state
            .ride
            .as_ref()
            .ok_or_else(|| RideError::ride_not_found(state.ride_id))?;
        if !ride.is_driven_by(actor) {
            return Err(RideError::Forbidden(
                "only the driver can change this ride".to_string(),
            ));
        }
        Ok(ride)
    }

    fn validate_publish(
        state: &RideState,
        driver_id: UserId,
        draft: &RideDraft,
        fleet: &[Vehicle],
        env: &LifecycleEnvironment,
    ) -> Result<PendingQuote, RideError> {
        if state.ride.is_some() {
            return Err(RideError::Conflict(format!(
                "ride {} already exists",
                state.ride_id
            )));
        }
        let ride = validate_new_ride(draft, env.clock.now(), env.timezone)?;
        let vehicle = select_vehicle(fleet, draft.vehicle_id)?;
        Ok(PendingQuote::Publish {
            driver_id,
            vehicle_id: vehicle.id,
            ride,
        })
    }

    fn validate_revise(
        state: &RideState,
        actor: UserId,
        changes: &RideChanges,
        fleet: &[Vehicle],
        env: &LifecycleEnvironment,
    ) -> Result<(PlannedRevision, VehicleId), RideError> {
        let ride = Self::validate_driver(state, actor)?;
        if ride.status != RideStatus::NotStarted {
            return Err(RideError::RideClosed {
                ride_id: ride.id,
                status: ride.status,
            });
        }

        let plan = plan_revision(ride, changes, env.clock.now(), env.timezone)?;
        let vehicle_id = match plan.vehicle_id {
            Some(requested) => select_vehicle(fleet, Some(requested))?.id,
            None => ride.vehicle_id,
        };

        if plan.seat_count < ride.seats_taken() {
            return Err(RideError::SeatsBelowPassengers {
                ride_id: ride.id,
                passengers: ride.seats_taken(),
                requested: plan.seat_count,
            });
        }

        Ok((plan, vehicle_id))
    }

    fn validate_transition(
        state: &RideState,
        actor: UserId,
        to: RideStatus,
    ) -> Result<RideStatus, RideError> {
        let ride = Self::validate_driver(state, actor)?;
        if !ride.status.can_transition_to(to) {
            return Err(RideError::InvalidTransition {
                ride_id: ride.id,
                from: ride.status,
                to,
            });
        }
        Ok(ride.status)
    }

    /// `plan` applied on top of `ride`, keeping passengers and status.
    fn revised(
        ride: &Ride,
        plan: PlannedRevision,
        vehicle_id: VehicleId,
        distance_km: f64,
        price: Price,
        at: DateTime<Utc>,
    ) -> Ride {
        Ride {
            vehicle_id,
            origin: plan.origin,
            destination: plan.destination,
            schedule: plan.schedule,
            seat_count: plan.seat_count,
            distance_km,
            price,
            updated_at: at,
            ..ride.clone()
        }
    }

    fn reject(state: &mut RideState, error: RideError) -> Vec<RideEffect> {
        tracing::debug!(ride_id = %state.ride_id, error = %error, "Ride command rejected");
        Self::apply_event(state, &RideAction::CommandRejected { error });
        Vec::new()
    }

    fn request_quote(state: &mut RideState, pending: PendingQuote) -> Vec<RideEffect> {
        let (origin, destination) = match &pending {
            PendingQuote::Publish { ride, .. } => (ride.origin.clone(), ride.destination.clone()),
            PendingQuote::Revise { plan, .. } => (plan.origin.clone(), plan.destination.clone()),
        };
        Self::apply_event(state, &RideAction::QuoteRequested { pending });
        vec![RideEffect::QuoteRoute {
            origin,
            destination,
        }]
    }

    /// Applies an event to state
    fn apply_event(state: &mut RideState, action: &RideAction) {
        match action {
            RideAction::QuoteRequested { pending } => {
                state.pending = Some(pending.clone());
                state.last_error = None;
            },
            RideAction::RidePublished { ride } | RideAction::RideRevised { ride } => {
                state.ride = Some(ride.clone());
                state.pending = None;
                state.last_error = None;
            },
            RideAction::StatusChanged { to, at, .. } => {
                if let Some(ride) = state.ride.as_mut() {
                    ride.status = *to;
                    ride.updated_at = *at;
                }
                state.last_error = None;
            },
            RideAction::RideDeleted { .. } => {
                state.ride = None;
                state.last_error = None;
            },
            RideAction::CommandRejected { error } => {
                state.pending = None;
                state.last_error = Some(error.clone());
            },
            // Commands don't modify state
            RideAction::PublishRide { .. }
            | RideAction::ReviseRide { .. }
            | RideAction::StartRide { .. }
            | RideAction::CompleteRide { .. }
            | RideAction::DeleteRide { .. }
            | RideAction::RouteQuoted { .. } => {},
        }
    }

    fn transition(
        state: &mut RideState,
        actor: UserId,
        to: RideStatus,
        env: &LifecycleEnvironment,
    ) -> Vec<RideEffect> {
        let from = match Self::validate_transition(state, actor, to) {
            Ok(from) => from,
            Err(error) => return Self::reject(state, error),
        };
        let at = env.clock.now();
        Self::apply_event(state, &RideAction::StatusChanged { from, to, at });
        vec![RideEffect::Persist(RideWrite::Transition {
            ride_id: state.ride_id,
            from,
            to,
            at,
        })]
    }
}

impl Reducer for RideReducer {
    type State = RideState;
    type Action = RideAction;
    type Environment = LifecycleEnvironment;
    type Effect = RideEffect;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Vec<Self::Effect> {
        match action {
            // ========== Commands ==========
            RideAction::PublishRide {
                driver_id,
                draft,
                fleet,
            } => match Self::validate_publish(state, driver_id, &draft, &fleet, env) {
                Ok(pending) => Self::request_quote(state, pending),
                Err(error) => Self::reject(state, error),
            },

            RideAction::ReviseRide {
                actor,
                changes,
                fleet,
            } => {
                let (plan, vehicle_id) =
                    match Self::validate_revise(state, actor, &changes, &fleet, env) {
                        Ok(valid) => valid,
                        Err(error) => return Self::reject(state, error),
                    };

                if plan.requote {
                    return Self::request_quote(state, PendingQuote::Revise { plan, vehicle_id });
                }

                let Some(current) = state.ride.as_ref() else {
                    return Self::reject(state, RideError::ride_not_found(state.ride_id));
                };
                let ride = Self::revised(
                    current,
                    plan,
                    vehicle_id,
                    current.distance_km,
                    current.price,
                    env.clock.now(),
                );
                Self::apply_event(state, &RideAction::RideRevised { ride: ride.clone() });
                vec![RideEffect::Persist(RideWrite::Update(ride))]
            },

            RideAction::StartRide { actor } => {
                Self::transition(state, actor, RideStatus::InProgress, env)
            },

            RideAction::CompleteRide { actor } => {
                Self::transition(state, actor, RideStatus::Completed, env)
            },

            RideAction::DeleteRide { actor } => {
                let driver_id = match Self::validate_driver(state, actor) {
                    Ok(ride) => ride.driver_id,
                    Err(error) => return Self::reject(state, error),
                };
                let ride_id = state.ride_id;
                Self::apply_event(state, &RideAction::RideDeleted { ride_id });
                vec![RideEffect::Persist(RideWrite::Delete { ride_id, driver_id })]
            },

            RideAction::RouteQuoted { distance_km } => {
                let now = env.clock.now();
                match state.pending.take() {
                    Some(PendingQuote::Publish {
                        driver_id,
                        vehicle_id,
                        ride,
                    }) => {
                        let quote = env.pricing.quote(distance_km, ride.seat_count);
                        let ride = Ride {
                            id: state.ride_id,
                            driver_id,
                            vehicle_id,
                            origin: ride.origin,
                            destination: ride.destination,
                            schedule: ride.schedule,
                            seat_count: ride.seat_count,
                            passenger_ids: Vec::new(),
                            status: RideStatus::NotStarted,
                            distance_km: quote.distance_km,
                            price: quote.price,
                            created_at: now,
                            updated_at: now,
                        };
                        Self::apply_event(state, &RideAction::RidePublished { ride: ride.clone() });
                        vec![RideEffect::Persist(RideWrite::Insert(ride))]
                    },
                    Some(PendingQuote::Revise { plan, vehicle_id }) => {
                        let Some(current) = state.ride.as_ref() else {
                            return Self::reject(state, RideError::ride_not_found(state.ride_id));
                        };
                        let quote = env.pricing.quote(distance_km, plan.seat_count);
                        let ride = Self::revised(
                            current,
                            plan,
                            vehicle_id,
                            quote.distance_km,
                            quote.price,
                            now,
                        );
                        Self::apply_event(state, &RideAction::RideRevised { ride: ride.clone() });
                        vec![RideEffect::Persist(RideWrite::Update(ride))]
                    },
                    None => Self::reject(
                        state,
                        RideError::Conflict("no route quote was requested".to_string()),
                    ),
                }
            },

            // ========== Events ==========
            event @ (RideAction::QuoteRequested { .. }
            | RideAction::RidePublished { .. }
            | RideAction::RideRevised { .. }
            | RideAction::StatusChanged { .. }
            | RideAction::RideDeleted { .. }
            | RideAction::CommandRejected { .. }) => {
                Self::apply_event(state, &event);
                Vec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::Schedule;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use chrono_tz::America::Sao_Paulo;

    struct StoppedClock(DateTime<Utc>);

    impl Clock for StoppedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Sao_Paulo
            .with_ymd_and_hms(2025, 6, 10, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn env() -> LifecycleEnvironment {
        LifecycleEnvironment::new(Arc::new(StoppedClock(now())), PricingPolicy::new(50), Sao_Paulo)
    }

    fn vehicle(owner_id: UserId) -> Vehicle {
        Vehicle {
            id: VehicleId::new(),
            owner_id,
            brand: "VW".to_string(),
            model: "Gol".to_string(),
            year: 2018,
            color: "Branco".to_string(),
            plate: "BRA2E19".to_string(),
            created_at: now(),
        }
    }

    fn ride(driver_id: UserId, status: RideStatus) -> Ride {
        Ride {
            id: RideId::new(),
            driver_id,
            vehicle_id: VehicleId::new(),
            origin: "Campinas".to_string(),
            destination: "Santos".to_string(),
            schedule: Schedule::new(
                NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
                NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            ),
            seat_count: 3,
            passenger_ids: Vec::new(),
            status,
            distance_km: 160.0,
            price: Price::from_cents(2667),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn draft() -> RideDraft {
        RideDraft {
            origin: Some("Campinas".to_string()),
            destination: Some("Santos".to_string()),
            date: Some("2025-06-12".to_string()),
            time: Some("07:30".to_string()),
            seat_count: Some(4),
            vehicle_id: None,
        }
    }

    #[test]
    fn test_publish_requests_quote_then_inserts() {
        let reducer = RideReducer::new();
        let env = env();
        let driver = UserId::new();
        let car = vehicle(driver);
        let mut state = RideState::new(RideId::new());

        let effects = reducer.reduce(
            &mut state,
            RideAction::PublishRide {
                driver_id: driver,
                draft: draft(),
                fleet: vec![car.clone()],
            },
            &env,
        );
        assert_eq!(
            effects,
            vec![RideEffect::QuoteRoute {
                origin: "Campinas".to_string(),
                destination: "Santos".to_string(),
            }]
        );
        assert!(state.pending.is_some());

        let effects = reducer.reduce(&mut state, RideAction::RouteQuoted { distance_km: 160.04 }, &env);

        let ride = state.ride.clone().unwrap();
        assert_eq!(effects, vec![RideEffect::Persist(RideWrite::Insert(ride.clone()))]);
        assert_eq!(ride.vehicle_id, car.id);
        assert_eq!(ride.status, RideStatus::NotStarted);
        assert!((ride.distance_km - 160.0).abs() < 1e-9);
        assert_eq!(ride.price, Price::from_cents(2000));
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_publish_without_vehicle_is_rejected() {
        let mut state = RideState::new(RideId::new());
        let effects = RideReducer::new().reduce(
            &mut state,
            RideAction::PublishRide {
                driver_id: UserId::new(),
                draft: draft(),
                fleet: Vec::new(),
            },
            &env(),
        );
        assert!(effects.is_empty());
        assert!(matches!(state.last_error, Some(RideError::VehicleSelection(_))));
    }

    #[test]
    fn test_only_driver_may_revise() {
        let driver = UserId::new();
        let mut state = RideState::loaded(ride(driver, RideStatus::NotStarted));
        let effects = RideReducer::new().reduce(
            &mut state,
            RideAction::ReviseRide {
                actor: UserId::new(),
                changes: RideChanges {
                    seat_count: Some(2),
                    ..RideChanges::default()
                },
                fleet: Vec::new(),
            },
            &env(),
        );
        assert!(effects.is_empty());
        assert!(matches!(state.last_error, Some(RideError::Forbidden(_))));
    }

    #[test]
    fn test_schedule_only_revision_skips_quote() {
        let driver = UserId::new();
        let original = ride(driver, RideStatus::NotStarted);
        let mut state = RideState::loaded(original.clone());

        let effects = RideReducer::new().reduce(
            &mut state,
            RideAction::ReviseRide {
                actor: driver,
                changes: RideChanges {
                    time: Some("18:00".to_string()),
                    ..RideChanges::default()
                },
                fleet: Vec::new(),
            },
            &env(),
        );

        let revised = state.ride.clone().unwrap();
        assert_eq!(effects, vec![RideEffect::Persist(RideWrite::Update(revised.clone()))]);
        assert_eq!(revised.schedule.time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(revised.price, original.price);
    }

    #[test]
    fn test_seat_change_requotes() {
        let driver = UserId::new();
        let mut state = RideState::loaded(ride(driver, RideStatus::NotStarted));
        let reducer = RideReducer::new();

        let effects = reducer.reduce(
            &mut state,
            RideAction::ReviseRide {
                actor: driver,
                changes: RideChanges {
                    seat_count: Some(4),
                    ..RideChanges::default()
                },
                fleet: Vec::new(),
            },
            &env(),
        );
        assert!(matches!(effects.as_slice(), [RideEffect::QuoteRoute { .. }]));

        reducer.reduce(&mut state, RideAction::RouteQuoted { distance_km: 160.0 }, &env());
        let revised = state.ride.unwrap();
        assert_eq!(revised.seat_count, 4);
        assert_eq!(revised.price, Price::from_cents(2000));
    }

    #[test]
    fn test_seat_count_cannot_drop_below_passengers() {
        let driver = UserId::new();
        let mut current = ride(driver, RideStatus::NotStarted);
        current.passenger_ids = vec![UserId::new(), UserId::new()];
        let mut state = RideState::loaded(current);

        RideReducer::new().reduce(
            &mut state,
            RideAction::ReviseRide {
                actor: driver,
                changes: RideChanges {
                    seat_count: Some(1),
                    ..RideChanges::default()
                },
                fleet: Vec::new(),
            },
            &env(),
        );

        assert!(matches!(
            state.last_error,
            Some(RideError::SeatsBelowPassengers {
                passengers: 2,
                requested: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_started_ride_cannot_be_revised() {
        let driver = UserId::new();
        let mut state = RideState::loaded(ride(driver, RideStatus::InProgress));
        RideReducer::new().reduce(
            &mut state,
            RideAction::ReviseRide {
                actor: driver,
                changes: RideChanges {
                    origin: Some("Jundiaí".to_string()),
                    ..RideChanges::default()
                },
                fleet: Vec::new(),
            },
            &env(),
        );
        assert!(matches!(
            state.last_error,
            Some(RideError::RideClosed {
                status: RideStatus::InProgress,
                ..
            })
        ));
    }

    #[test]
    fn test_status_moves_forward_only() {
        let driver = UserId::new();
        let reducer = RideReducer::new();
        let mut state = RideState::loaded(ride(driver, RideStatus::NotStarted));

        reducer.reduce(&mut state, RideAction::CompleteRide { actor: driver }, &env());
        assert!(matches!(
            state.last_error,
            Some(RideError::InvalidTransition {
                from: RideStatus::NotStarted,
                to: RideStatus::Completed,
                ..
            })
        ));

        let effects = reducer.reduce(&mut state, RideAction::StartRide { actor: driver }, &env());
        assert_eq!(
            effects,
            vec![RideEffect::Persist(RideWrite::Transition {
                ride_id: state.ride_id,
                from: RideStatus::NotStarted,
                to: RideStatus::InProgress,
                at: now(),
            })]
        );
        assert!(state.last_error.is_none());

        reducer.reduce(&mut state, RideAction::CompleteRide { actor: driver }, &env());
        assert_eq!(state.ride.as_ref().unwrap().status, RideStatus::Completed);

        let effects = reducer.reduce(&mut state, RideAction::StartRide { actor: driver }, &env());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_delete_requires_driver() {
        let driver = UserId::new();
        let reducer = RideReducer::new();
        let mut state = RideState::loaded(ride(driver, RideStatus::InProgress));

        let effects = reducer.reduce(&mut state, RideAction::DeleteRide { actor: UserId::new() }, &env());
        assert!(effects.is_empty());
        assert!(state.ride.is_some());

        let effects = reducer.reduce(&mut state, RideAction::DeleteRide { actor: driver }, &env());
        assert_eq!(
            effects,
            vec![RideEffect::Persist(RideWrite::Delete {
                ride_id: state.ride_id,
                driver_id: driver,
            })]
        );
        assert!(state.ride.is_none());
    }

    #[test]
    fn test_unrequested_quote_is_rejected() {
        let mut state = RideState::new(RideId::new());
        let effects =
            RideReducer::new().reduce(&mut state, RideAction::RouteQuoted { distance_km: 1.0 }, &env());
        assert!(effects.is_empty());
        assert!(matches!(state.last_error, Some(RideError::Conflict(_))));
    }
}
