//! User and vehicle registration.

use crate::context::ActorContext;
use crate::environment::RideEnvironment;
use crate::error::{Result, RideError};
use crate::types::{User, UserId, Vehicle, VehicleId};
use crate::validation::{NewUser, NewVehicle, validate_user, validate_vehicle};
use chrono::Datelike;

/// Registers users and their vehicles.
#[derive(Clone)]
pub struct DirectoryService {
    env: RideEnvironment,
}

impl DirectoryService {
    /// Creates a new `DirectoryService`
    #[must_use]
    pub const fn new(env: RideEnvironment) -> Self {
        Self { env }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// - [`RideError::Validation`] for missing or malformed fields
    /// - [`RideError::Conflict`] when the email is taken
    pub async fn register_user(&self, input: NewUser) -> Result<User> {
        let valid = validate_user(&input)?;
        let user = User {
            id: UserId::new(),
            name: valid.name,
            email: valid.email,
            phone: valid.phone,
            created_at: self.env.clock.now(),
        };

        self.env.users.insert_user(&user).await?;

        metrics::counter!("users.registered").increment(1);
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Look up a user.
    ///
    /// # Errors
    ///
    /// Returns [`RideError::NotFound`] for unknown users.
    pub async fn get_user(&self, user_id: UserId) -> Result<User> {
        self.env
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| RideError::user_not_found(user_id))
    }

    /// Register a vehicle for the caller.
    ///
    /// # Errors
    ///
    /// - [`RideError::NotFound`] if the caller is not registered
    /// - [`RideError::Validation`] for missing fields, bad year or plate
    /// - [`RideError::Conflict`] when the plate is already registered
    #[tracing::instrument(
        skip_all,
        fields(owner_id = %ctx.user_id, correlation_id = %ctx.correlation_id)
    )]
    pub async fn register_vehicle(&self, ctx: &ActorContext, input: NewVehicle) -> Result<Vehicle> {
        let owner = self.get_user(ctx.user_id).await?;
        let now = self.env.clock.now();
        let valid = validate_vehicle(&input, now.with_timezone(&self.env.timezone).year())?;

        let vehicle = Vehicle {
            id: VehicleId::new(),
            owner_id: owner.id,
            brand: valid.brand,
            model: valid.model,
            year: valid.year,
            color: valid.color,
            plate: valid.plate,
            created_at: now,
        };

        self.env.vehicles.insert_vehicle(&vehicle).await?;

        tracing::info!(vehicle_id = %vehicle.id, plate = %vehicle.plate, "Vehicle registered");
        Ok(vehicle)
    }

    /// Vehicles the caller owns, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RideError::Store`] on storage failure.
    pub async fn list_vehicles(&self, ctx: &ActorContext) -> Result<Vec<Vehicle>> {
        Ok(self.env.vehicles.vehicles_by_owner(ctx.user_id).await?)
    }
}
