//! Row ↔ domain mapping.

use carona_core::error::StoreError;
use carona_core::types::{
    DriverSummary, Price, Ride, RideDetails, RideId, RideStatus, Schedule, User, UserId,
    Vehicle, VehicleId, VehicleSummary,
};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

/// Ride columns joined with the driver and vehicle fields used by listings.
pub(crate) const DETAILS_SELECT: &str = r"
    SELECT r.*,
           u.name  AS driver_name,
           u.phone AS driver_phone,
           v.brand AS vehicle_brand,
           v.model AS vehicle_model,
           v.year  AS vehicle_year,
           v.color AS vehicle_color,
           v.plate AS vehicle_plate
    FROM rides r
    JOIN users u ON u.id = r.driver_id
    JOIN vehicles v ON v.id = r.vehicle_id
";

fn corrupt(e: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(e.to_string())
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(corrupt)
}

/// Map a `rides` row.
pub(crate) fn ride(row: &PgRow) -> Result<Ride, StoreError> {
    let status: String = get(row, "status")?;
    let seat_count: i32 = get(row, "seat_count")?;
    let passengers: Vec<Uuid> = get(row, "passenger_ids")?;

    Ok(Ride {
        id: RideId::from_uuid(get(row, "id")?),
        driver_id: UserId::from_uuid(get(row, "driver_id")?),
        vehicle_id: VehicleId::from_uuid(get(row, "vehicle_id")?),
        origin: get(row, "origin")?,
        destination: get(row, "destination")?,
        schedule: Schedule::new(get(row, "departure_date")?, get(row, "departure_time")?),
        seat_count: u32::try_from(seat_count).map_err(corrupt)?,
        passenger_ids: passengers.into_iter().map(UserId::from_uuid).collect(),
        status: status.parse::<RideStatus>().map_err(corrupt)?,
        distance_km: get(row, "distance_km")?,
        price: Price::from_cents(get(row, "price_cents")?),
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

/// Map a [`DETAILS_SELECT`] row.
pub(crate) fn details(row: &PgRow) -> Result<RideDetails, StoreError> {
    let ride = ride(row)?;
    Ok(RideDetails {
        driver: DriverSummary {
            id: ride.driver_id,
            name: get(row, "driver_name")?,
            phone: get(row, "driver_phone")?,
        },
        vehicle: VehicleSummary {
            id: ride.vehicle_id,
            brand: get(row, "vehicle_brand")?,
            model: get(row, "vehicle_model")?,
            year: get(row, "vehicle_year")?,
            color: get(row, "vehicle_color")?,
            plate: get(row, "vehicle_plate")?,
        },
        ride,
    })
}

pub(crate) fn vehicle(row: &PgRow) -> Result<Vehicle, StoreError> {
    Ok(Vehicle {
        id: VehicleId::from_uuid(get(row, "id")?),
        owner_id: UserId::from_uuid(get(row, "owner_id")?),
        brand: get(row, "brand")?,
        model: get(row, "model")?,
        year: get(row, "year")?,
        color: get(row, "color")?,
        plate: get(row, "plate")?,
        created_at: get(row, "created_at")?,
    })
}

pub(crate) fn user(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: UserId::from_uuid(get(row, "id")?),
        name: get(row, "name")?,
        email: get(row, "email")?,
        phone: get(row, "phone")?,
        created_at: get(row, "created_at")?,
    })
}

/// Escape `LIKE` metacharacters so user text matches literally.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
