//! `PostgreSQL` storage for Carona.
//!
//! [`PostgresStore`] implements the `RideStore`, `VehicleStore` and
//! `UserDirectory` traits from `carona-core` on top of a sqlx pool, with the
//! schema shipped as embedded migrations (`migrations/`).
//!
//! Passengers are stored in a `UUID[]` column on the ride row, which keeps
//! every reservation a single conditional statement:
//!
//! ```sql
//! UPDATE rides SET passenger_ids = array_append(passenger_ids, $2)
//! WHERE id = $1 AND status = 'not_started' AND driver_id <> $2
//!   AND NOT ($2 = ANY(passenger_ids))
//!   AND cardinality(passenger_ids) < seat_count
//! RETURNING *
//! ```
//!
//! # Example
//!
//! ```ignore
//! use carona_postgres::PostgresStore;
//! use sqlx::postgres::PgPoolOptions;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = PgPoolOptions::new().max_connections(10).connect("postgres://localhost/carona").await?;
//!     let store = PostgresStore::from_pool(pool);
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

mod rows;
mod store;

pub use store::PostgresStore;
