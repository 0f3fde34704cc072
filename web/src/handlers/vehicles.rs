//! Vehicle registration.

use crate::error::AppError;
use crate::extractors::{AuthenticatedUser, JsonBody};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use carona_core::{NewVehicle, Vehicle};
use serde::Deserialize;

/// Body of `POST /api/vehicles`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterVehicleRequest {
    /// Manufacturer
    pub brand: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// Model year
    pub year: Option<i32>,
    /// Color
    pub color: Option<String>,
    /// License plate
    pub plate: Option<String>,
}

impl From<RegisterVehicleRequest> for NewVehicle {
    fn from(request: RegisterVehicleRequest) -> Self {
        Self {
            brand: request.brand,
            model: request.model,
            year: request.year,
            color: request.color,
            plate: request.plate,
        }
    }
}

/// Register a vehicle owned by the caller.
///
/// # Errors
///
/// 422 for invalid fields, 409 when the plate is taken, 404 when the caller
/// is not registered.
pub async fn register_vehicle(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    JsonBody(request): JsonBody<RegisterVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    let vehicle = state.directory.register_vehicle(&ctx, request.into()).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// Vehicles owned by the caller.
///
/// # Errors
///
/// 500 on storage failure.
pub async fn list_vehicles(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    Ok(Json(state.directory.list_vehicles(&ctx).await?))
}
