//! Error types for ride operations.

use crate::types::{RideId, RideStatus, UserId};
use thiserror::Error;

/// Errors raised by the storage layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Database connection or query failed
    #[error("database error: {0}")]
    Database(String),

    /// A uniqueness constraint was violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored row could not be mapped back to a domain type
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Errors raised by the distance lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DistanceError {
    /// HTTP request failed (connection, TLS, timeout)
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// API answered with a non-success HTTP status
    #[error("distance API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body or API error message
        message: String,
    },

    /// No route exists between the two places
    #[error("no route found from '{origin}' to '{destination}'")]
    RouteNotFound {
        /// Requested origin
        origin: String,
        /// Requested destination
        destination: String,
    },

    /// Response body could not be understood
    #[error("invalid distance response: {0}")]
    InvalidResponse(String),
}

/// Errors returned by ride, vehicle and user operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RideError {
    /// Input failed validation (missing fields, schedule, seat count)
    #[error("{0}")]
    Validation(String),

    /// The vehicle for a ride could not be determined
    #[error("{0}")]
    VehicleSelection(String),

    /// A referenced resource does not exist
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Resource kind ("Ride", "User", ...)
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The requester is not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// The passenger already holds a seat on the ride
    #[error("user {user_id} already has a seat on ride {ride_id}")]
    AlreadyReserved {
        /// Ride
        ride_id: RideId,
        /// Passenger
        user_id: UserId,
    },

    /// Every seat is taken
    #[error("ride {ride_id} is full ({seat_count} seats)")]
    Full {
        /// Ride
        ride_id: RideId,
        /// Capacity of the ride
        seat_count: u32,
    },

    /// The ride no longer accepts the operation in its current status
    #[error("ride {ride_id} is {status} and does not accept this operation")]
    RideClosed {
        /// Ride
        ride_id: RideId,
        /// Current status
        status: RideStatus,
    },

    /// Illegal status transition
    #[error("ride {ride_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Ride
        ride_id: RideId,
        /// Current status
        from: RideStatus,
        /// Requested status
        to: RideStatus,
    },

    /// A seat count edit would strand existing passengers
    #[error("ride {ride_id} has {passengers} passengers; seat count cannot drop to {requested}")]
    SeatsBelowPassengers {
        /// Ride
        ride_id: RideId,
        /// Current passenger count
        passengers: u32,
        /// Requested seat count
        requested: u32,
    },

    /// Uniqueness conflict (email, plate)
    #[error("{0}")]
    Conflict(String),

    /// Distance lookup failed; nothing was persisted
    #[error("distance lookup failed: {0}")]
    DistanceUnavailable(#[from] DistanceError),

    /// Storage failure
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl RideError {
    /// Shorthand for a `NotFound` ride.
    #[must_use]
    pub fn ride_not_found(ride_id: RideId) -> Self {
        Self::NotFound {
            resource: "Ride",
            id: ride_id.to_string(),
        }
    }

    /// Shorthand for a `NotFound` user.
    #[must_use]
    pub fn user_not_found(user_id: UserId) -> Self {
        Self::NotFound {
            resource: "User",
            id: user_id.to_string(),
        }
    }
}

impl From<StoreError> for RideError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(message) => Self::Conflict(message),
            other => Self::Store(other),
        }
    }
}

/// Result alias for ride operations.
pub type Result<T> = std::result::Result<T, RideError>;
