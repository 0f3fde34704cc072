//! Ride endpoints: publishing, search, lifecycle and reservations.

use crate::error::AppError;
use crate::extractors::{AuthenticatedUser, JsonBody};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use carona_core::{
    Ride, RideChanges, RideDetails, RideDraft, RideError, RideId, RideQuery, VehicleId,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

/// Body of `POST /api/rides` and `PUT /api/rides/:id`.
///
/// For updates, absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RideRequest {
    /// Departure place
    pub origin: Option<String>,
    /// Arrival place
    pub destination: Option<String>,
    /// Local date, `YYYY-MM-DD`
    pub date: Option<String>,
    /// Local time, `HH:MM`
    pub time: Option<String>,
    /// Seats offered
    #[serde(alias = "seatCount", alias = "seats")]
    pub seat_count: Option<i64>,
    /// Vehicle to use
    #[serde(alias = "vehicleId", alias = "vehicle")]
    pub vehicle_id: Option<Uuid>,
}

impl From<RideRequest> for RideDraft {
    fn from(request: RideRequest) -> Self {
        Self {
            origin: request.origin,
            destination: request.destination,
            date: request.date,
            time: request.time,
            seat_count: request.seat_count,
            vehicle_id: request.vehicle_id.map(VehicleId::from_uuid),
        }
    }
}

impl From<RideRequest> for RideChanges {
    fn from(request: RideRequest) -> Self {
        Self {
            origin: request.origin,
            destination: request.destination,
            date: request.date,
            time: request.time,
            seat_count: request.seat_count,
            vehicle_id: request.vehicle_id.map(VehicleId::from_uuid),
        }
    }
}

/// Query string of `GET /api/rides/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Substring of the origin
    pub origin: Option<String>,
    /// Substring of the destination
    pub destination: Option<String>,
    /// Earliest departure date, `YYYY-MM-DD`
    pub date: Option<String>,
}

impl TryFrom<SearchParams> for RideQuery {
    type Error = AppError;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        let date = params
            .date
            .as_deref()
            .map(str::trim)
            .filter(|date| !date.is_empty())
            .map(|date| {
                NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                    AppError::from(RideError::Validation(format!("invalid date '{date}'")))
                })
            })
            .transpose()?;

        Ok(Self {
            origin: params.origin,
            destination: params.destination,
            date,
        })
    }
}

fn parse_ride_id(raw: &str) -> Result<RideId, AppError> {
    Uuid::parse_str(raw)
        .map(RideId::from_uuid)
        .map_err(|_| AppError::bad_request(format!("invalid ride id '{raw}'")))
}

/// Publish a ride as the caller.
///
/// ```text
/// POST /api/rides
/// {"origin": "Campinas", "destination": "São Paulo", "date": "2025-06-11",
///  "time": "08:00", "seat_count": 3}
/// ```
///
/// # Errors
///
/// 422 for invalid input or vehicle selection, 502 when the distance lookup
/// fails.
pub async fn create_ride(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    JsonBody(request): JsonBody<RideRequest>,
) -> Result<(StatusCode, Json<RideDetails>), AppError> {
    let ride = state.rides.create_ride(&ctx, request.into()).await?;
    Ok((StatusCode::CREATED, Json(ride)))
}

/// Rides the caller drives.
///
/// # Errors
///
/// 500 on storage failure.
pub async fn list_driver_rides(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<Json<Vec<RideDetails>>, AppError> {
    Ok(Json(state.rides.list_driver_rides(&ctx).await?))
}

/// Rides the caller has a seat on.
///
/// # Errors
///
/// 500 on storage failure.
pub async fn list_reserved_rides(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<Json<Vec<RideDetails>>, AppError> {
    Ok(Json(state.rides.list_reserved_rides(&ctx).await?))
}

/// Open rides by origin, destination and earliest date.
///
/// ```text
/// GET /api/rides/search?origin=campinas&destination=paulo&date=2025-06-11
/// ```
///
/// # Errors
///
/// 422 for a malformed date.
pub async fn search_rides(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<RideDetails>>, AppError> {
    let query = RideQuery::try_from(params)?;
    Ok(Json(state.rides.search_rides(&query).await?))
}

/// One ride with driver and vehicle details.
///
/// # Errors
///
/// 400 for a malformed id, 404 for unknown rides.
pub async fn get_ride(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RideDetails>, AppError> {
    Ok(Json(state.rides.get_ride(parse_ride_id(&id)?).await?))
}

/// Edit a ride the caller drives.
///
/// # Errors
///
/// 403 for non-drivers, 409 once started or when seats would drop below the
/// passenger count, 422 for invalid changes.
pub async fn update_ride(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<RideRequest>,
) -> Result<Json<Ride>, AppError> {
    let ride_id = parse_ride_id(&id)?;
    Ok(Json(state.rides.update_ride(&ctx, ride_id, request.into()).await?))
}

/// Delete a ride the caller drives.
///
/// # Errors
///
/// 403 for non-drivers, 404 for unknown rides.
pub async fn delete_ride(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.rides.delete_ride(&ctx, parse_ride_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `not_started → in_progress`.
///
/// # Errors
///
/// 403 for non-drivers, 409 from any other status.
pub async fn start_ride(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Ride>, AppError> {
    Ok(Json(state.rides.start_ride(&ctx, parse_ride_id(&id)?).await?))
}

/// `in_progress → completed`.
///
/// # Errors
///
/// 403 for non-drivers, 409 from any other status.
pub async fn complete_ride(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Ride>, AppError> {
    Ok(Json(state.rides.complete_ride(&ctx, parse_ride_id(&id)?).await?))
}

/// Reserve a seat for the caller.
///
/// # Errors
///
/// 409 when full, already reserved or closed; 403 for the driver.
pub async fn reserve_seat(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Ride>), AppError> {
    let ride = state.rides.reserve_seat(&ctx, parse_ride_id(&id)?).await?;
    Ok((StatusCode::CREATED, Json(ride)))
}

/// Give up the caller's seat. Succeeds when no seat was held.
///
/// # Errors
///
/// 404 for unknown rides, 409 for completed rides.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Ride>, AppError> {
    Ok(Json(
        state.rides.cancel_reservation(&ctx, parse_ride_id(&id)?).await?,
    ))
}
