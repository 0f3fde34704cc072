//! # Carona Core
//!
//! Ride lifecycle, seat reservation and pricing rules for the Carona ride
//! sharing service.
//!
//! ## Core Concepts
//!
//! - **Ride**: a driver-published trip with a schedule, a fixed number of
//!   seats and a per-seat price derived from the route distance
//! - **Reducer**: pure `(State, Action, Environment) → (State, Effects)`
//!   deciding what publishing, editing and status changes do
//! - **Effects**: descriptions of route lookups and conditional store writes,
//!   executed by [`RideService`]
//! - **Environment**: stores, distance lookup and clock injected as traits
//!
//! Seat reservation is the one write the reducer does not decide: its
//! check-and-append has to be atomic under concurrency, so it lives in
//! [`RideStore::reserve_seat`] with [`Ride::admit_passenger`] as the
//! reference rule.
//!
//! ## Example
//!
//! ```ignore
//! use carona_core::*;
//!
//! let service = RideService::new(env);
//! let ctx = ActorContext::new(driver_id);
//!
//! let ride = service
//!     .create_ride(&ctx, RideDraft {
//!         origin: Some("Campinas".into()),
//!         destination: Some("São Paulo".into()),
//!         date: Some("2025-06-12".into()),
//!         time: Some("07:30".into()),
//!         seat_count: Some(3),
//!         vehicle_id: None,
//!     })
//!     .await?;
//! ```

pub mod context;
pub mod directory;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod pricing;
pub mod reservation;
pub mod service;
pub mod types;
pub mod validation;

/// Reducer module - The core trait for business logic
pub mod reducer {
    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    /// - `Effect`: Side effect descriptions returned to the caller
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// The effect type this reducer requests
        type Effect;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Vec<Self::Effect>;
    }
}

pub use context::ActorContext;
pub use directory::DirectoryService;
pub use environment::{
    Clock, DistanceService, RideEnvironment, RideStore, SystemClock, UpdateOutcome, UserDirectory,
    VehicleStore,
};
pub use error::{DistanceError, Result, RideError, StoreError};
pub use lifecycle::{
    LifecycleEnvironment, PendingQuote, RideAction, RideEffect, RideReducer, RideState, RideWrite,
};
pub use pricing::{PricingPolicy, RouteQuote};
pub use reducer::Reducer;
pub use reservation::{CancellationOutcome, ReservationOutcome, ReservationRejection};
pub use service::RideService;
pub use types::{
    DriverSummary, Price, Ride, RideDetails, RideId, RideQuery, RideStatus, Schedule, User,
    UserId, Vehicle, VehicleId, VehicleSummary,
};
pub use validation::{NewUser, NewVehicle, RideChanges, RideDraft};
