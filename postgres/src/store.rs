//! [`PostgresStore`]: every Carona store trait over one connection pool.

use crate::rows::{self, DETAILS_SELECT};
use carona_core::environment::{RideStore, UpdateOutcome, UserDirectory, VehicleStore};
use carona_core::error::StoreError;
use carona_core::reservation::{CancellationOutcome, ReservationOutcome};
use carona_core::types::{
    Ride, RideDetails, RideId, RideQuery, RideStatus, User, UserId, Vehicle, VehicleId,
};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// How often a conditional write is retried when the follow-up read finds
/// that its condition now holds (the row changed between the two statements).
const CONDITIONAL_ATTEMPTS: usize = 3;

/// Claim a seat: append the passenger only while the ride is open, not driven
/// by them, not already holding them, and not full.
const RESERVE_SEAT: &str = r"
    UPDATE rides
    SET passenger_ids = array_append(passenger_ids, $2),
        updated_at = $3
    WHERE id = $1
      AND status = 'not_started'
      AND driver_id <> $2
      AND NOT ($2 = ANY(passenger_ids))
      AND cardinality(passenger_ids) < seat_count
    RETURNING *
";

const CANCEL_RESERVATION: &str = r"
    UPDATE rides
    SET passenger_ids = array_remove(passenger_ids, $2),
        updated_at = $3
    WHERE id = $1
      AND status <> 'completed'
      AND $2 = ANY(passenger_ids)
    RETURNING *
";

/// Rewrite editable fields; the seat floor is checked against the passengers
/// present at write time.
const UPDATE_RIDE: &str = r"
    UPDATE rides
    SET vehicle_id = $2,
        origin = $3,
        destination = $4,
        departure_date = $5,
        departure_time = $6,
        seat_count = $7,
        distance_km = $8,
        price_cents = $9,
        updated_at = $10
    WHERE id = $1
      AND status = 'not_started'
      AND cardinality(passenger_ids) <= $7
    RETURNING *
";

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Map a failed insert, turning unique violations into `Conflict`.
fn insert_error(e: sqlx::Error, conflict: impl FnOnce() -> String) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(conflict()),
        _ => db_error(e),
    }
}

fn seat_column(seat_count: u32) -> Result<i32, StoreError> {
    i32::try_from(seat_count).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// `PostgreSQL`-backed ride, vehicle and user store.
///
/// Reservation, cancellation, edits and status changes are single
/// conditional `UPDATE ... RETURNING` statements, so concurrent requests are
/// serialized by the row lock and never overbook a ride.
///
/// # Example
///
/// ```no_run
/// use carona_postgres::PostgresStore;
///
/// # async fn example() -> Result<(), carona_core::error::StoreError> {
/// let store = PostgresStore::connect("postgres://localhost/carona").await?;
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .connect(database_url)
            .await
            .map_err(db_error)?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    async fn fetch_ride(&self, ride_id: RideId) -> Result<Option<Ride>, StoreError> {
        sqlx::query("SELECT * FROM rides WHERE id = $1")
            .bind(*ride_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(|row| rows::ride(&row))
            .transpose()
    }

    async fn fetch_details(&self, sql: &str, bind: uuid::Uuid) -> Result<Vec<RideDetails>, StoreError> {
        sqlx::query(sql)
            .bind(bind)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(rows::details)
            .collect()
    }
}

impl RideStore for PostgresStore {
    fn insert_ride<'a>(&'a self, ride: &'a Ride) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let passengers: Vec<uuid::Uuid> =
                ride.passenger_ids.iter().map(|id| *id.as_uuid()).collect();

            sqlx::query(
                r"
                INSERT INTO rides (
                    id, driver_id, vehicle_id, origin, destination,
                    departure_date, departure_time, seat_count, passenger_ids,
                    status, distance_km, price_cents, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ",
            )
            .bind(*ride.id.as_uuid())
            .bind(*ride.driver_id.as_uuid())
            .bind(*ride.vehicle_id.as_uuid())
            .bind(&ride.origin)
            .bind(&ride.destination)
            .bind(ride.schedule.date)
            .bind(ride.schedule.time)
            .bind(seat_column(ride.seat_count)?)
            .bind(passengers)
            .bind(ride.status.as_str())
            .bind(ride.distance_km)
            .bind(ride.price.cents())
            .bind(ride.created_at)
            .bind(ride.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, || format!("ride {} already exists", ride.id)))?;

            tracing::debug!(ride_id = %ride.id, "ride inserted");
            Ok(())
        })
    }

    fn get_ride(&self, ride_id: RideId) -> BoxFuture<'_, Result<Option<Ride>, StoreError>> {
        Box::pin(self.fetch_ride(ride_id))
    }

    fn get_ride_details(
        &self,
        ride_id: RideId,
    ) -> BoxFuture<'_, Result<Option<RideDetails>, StoreError>> {
        Box::pin(async move {
            let sql = format!("{DETAILS_SELECT} WHERE r.id = $1");
            Ok(self
                .fetch_details(&sql, *ride_id.as_uuid())
                .await?
                .into_iter()
                .next())
        })
    }

    fn search_rides<'a>(
        &'a self,
        query: &'a RideQuery,
    ) -> BoxFuture<'a, Result<Vec<RideDetails>, StoreError>> {
        Box::pin(async move {
            let sql = format!(
                r"{DETAILS_SELECT}
                WHERE r.status <> 'completed'
                  AND ($1::text IS NULL OR r.origin ILIKE $1 ESCAPE '\')
                  AND ($2::text IS NULL OR r.destination ILIKE $2 ESCAPE '\')
                  AND ($3::date IS NULL OR r.departure_date >= $3)
                ORDER BY r.departure_date, r.departure_time, r.created_at"
            );

            sqlx::query(&sql)
                .bind(query.origin.as_deref().map(rows::like_pattern))
                .bind(query.destination.as_deref().map(rows::like_pattern))
                .bind(query.date)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?
                .iter()
                .map(rows::details)
                .collect()
        })
    }

    fn rides_by_driver(
        &self,
        driver_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<RideDetails>, StoreError>> {
        Box::pin(async move {
            let sql = format!(
                "{DETAILS_SELECT} WHERE r.driver_id = $1 \
                 ORDER BY r.departure_date DESC, r.departure_time DESC, r.created_at DESC"
            );
            self.fetch_details(&sql, *driver_id.as_uuid()).await
        })
    }

    fn rides_by_passenger(
        &self,
        passenger_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<RideDetails>, StoreError>> {
        Box::pin(async move {
            let sql = format!(
                "{DETAILS_SELECT} WHERE $1 = ANY(r.passenger_ids) \
                 ORDER BY r.departure_date, r.departure_time, r.created_at"
            );
            self.fetch_details(&sql, *passenger_id.as_uuid()).await
        })
    }

    fn reserve_seat(
        &self,
        ride_id: RideId,
        passenger_id: UserId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<ReservationOutcome, StoreError>> {
        Box::pin(async move {
            for _ in 0..CONDITIONAL_ATTEMPTS {
                let row = sqlx::query(RESERVE_SEAT)
                    .bind(*ride_id.as_uuid())
                    .bind(*passenger_id.as_uuid())
                    .bind(at)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error)?;

                if let Some(row) = row {
                    return Ok(ReservationOutcome::Reserved(rows::ride(&row)?));
                }

                // Nothing updated: read the row to say why.
                let Some(current) = self.fetch_ride(ride_id).await? else {
                    return Ok(ReservationOutcome::NotFound);
                };
                if let Err(rejection) = current.check_reservation(passenger_id) {
                    return Ok(ReservationOutcome::Rejected(rejection));
                }
                tracing::debug!(%ride_id, "ride changed between reservation and re-read, retrying");
                metrics::counter!("store.conditional_retries", "op" => "reserve").increment(1);
            }

            Err(StoreError::Database(format!(
                "reservation on ride {ride_id} did not settle after {CONDITIONAL_ATTEMPTS} attempts"
            )))
        })
    }

    fn cancel_reservation(
        &self,
        ride_id: RideId,
        passenger_id: UserId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<CancellationOutcome, StoreError>> {
        Box::pin(async move {
            let row = sqlx::query(CANCEL_RESERVATION)
                .bind(*ride_id.as_uuid())
                .bind(*passenger_id.as_uuid())
                .bind(at)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

            if let Some(row) = row {
                return Ok(CancellationOutcome::Cancelled(rows::ride(&row)?));
            }

            Ok(match self.fetch_ride(ride_id).await? {
                None => CancellationOutcome::NotFound,
                Some(ride) if ride.status.is_terminal() => CancellationOutcome::Closed(ride.status),
                Some(ride) => CancellationOutcome::NotReserved(ride),
            })
        })
    }

    fn update_ride<'a>(&'a self, ride: &'a Ride) -> BoxFuture<'a, Result<UpdateOutcome, StoreError>> {
        Box::pin(async move {
            let seat_count = seat_column(ride.seat_count)?;

            for _ in 0..CONDITIONAL_ATTEMPTS {
                let row = sqlx::query(UPDATE_RIDE)
                    .bind(*ride.id.as_uuid())
                    .bind(*ride.vehicle_id.as_uuid())
                    .bind(&ride.origin)
                    .bind(&ride.destination)
                    .bind(ride.schedule.date)
                    .bind(ride.schedule.time)
                    .bind(seat_count)
                    .bind(ride.distance_km)
                    .bind(ride.price.cents())
                    .bind(ride.updated_at)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error)?;

                if let Some(row) = row {
                    return Ok(UpdateOutcome::Updated(rows::ride(&row)?));
                }

                let Some(current) = self.fetch_ride(ride.id).await? else {
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
                tracing::debug!(ride_id = %ride.id, "ride changed between update and re-read, retrying");
                metrics::counter!("store.conditional_retries", "op" => "update").increment(1);
            }

            Err(StoreError::Database(format!(
                "update of ride {} did not settle after {CONDITIONAL_ATTEMPTS} attempts",
                ride.id
            )))
        })
    }

    fn transition_status(
        &self,
        ride_id: RideId,
        from: RideStatus,
        to: RideStatus,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Option<Ride>, StoreError>> {
        Box::pin(async move {
            let row = sqlx::query(
                "UPDATE rides SET status = $3, updated_at = $4 \
                 WHERE id = $1 AND status = $2 RETURNING *",
            )
            .bind(*ride_id.as_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

            if row.is_some() {
                tracing::debug!(%ride_id, %from, %to, "ride status changed");
            }
            row.map(|row| rows::ride(&row)).transpose()
        })
    }

    fn delete_ride(
        &self,
        ride_id: RideId,
        driver_id: UserId,
    ) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM rides WHERE id = $1 AND driver_id = $2")
                .bind(*ride_id.as_uuid())
                .bind(*driver_id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(())
        })
    }
}

impl VehicleStore for PostgresStore {
    fn insert_vehicle<'a>(&'a self, vehicle: &'a Vehicle) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO vehicles (id, owner_id, brand, model, year, color, plate, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(*vehicle.id.as_uuid())
            .bind(*vehicle.owner_id.as_uuid())
            .bind(&vehicle.brand)
            .bind(&vehicle.model)
            .bind(vehicle.year)
            .bind(&vehicle.color)
            .bind(&vehicle.plate)
            .bind(vehicle.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                insert_error(e, || format!("plate {} is already registered", vehicle.plate))
            })?;
            Ok(())
        })
    }

    fn get_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> BoxFuture<'_, Result<Option<Vehicle>, StoreError>> {
        Box::pin(async move {
            sqlx::query("SELECT * FROM vehicles WHERE id = $1")
                .bind(*vehicle_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?
                .map(|row| rows::vehicle(&row))
                .transpose()
        })
    }

    fn vehicles_by_owner(
        &self,
        owner_id: UserId,
    ) -> BoxFuture<'_, Result<Vec<Vehicle>, StoreError>> {
        Box::pin(async move {
            sqlx::query("SELECT * FROM vehicles WHERE owner_id = $1 ORDER BY created_at, plate")
                .bind(*owner_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?
                .iter()
                .map(rows::vehicle)
                .collect()
        })
    }
}

impl UserDirectory for PostgresStore {
    fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO users (id, name, email, phone, created_at) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(*user.id.as_uuid())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, || format!("email {} is already registered", user.email)))?;
            Ok(())
        })
    }

    fn get_user(&self, user_id: UserId) -> BoxFuture<'_, Result<Option<User>, StoreError>> {
        Box::pin(async move {
            sqlx::query("SELECT * FROM users WHERE id = $1")
                .bind(*user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?
                .map(|row| rows::user(&row))
                .transpose()
        })
    }
}
