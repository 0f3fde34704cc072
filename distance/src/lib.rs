//! # Carona Distance
//!
//! Production [`DistanceService`](carona_core::environment::DistanceService)
//! for ride pricing. Calls a Distance-Matrix style JSON API:
//!
//! ```text
//! GET {base_url}?origins=..&destinations=..&key=..&units=metric
//! ```
//!
//! and reads `rows[0].elements[0].distance.value` (meters).
//!
//! ## Example
//!
//! ```no_run
//! use carona_distance::{DistanceConfig, HttpDistanceService};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), carona_core::error::DistanceError> {
//! let service = HttpDistanceService::new(
//!     DistanceConfig::new("api-key").with_timeout(Duration::from_secs(3)),
//! )?;
//! let km = service.lookup("Campinas, SP", "São Paulo, SP").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod response;

pub use client::{DEFAULT_API_URL, DistanceConfig, HttpDistanceService};
pub use response::MatrixResponse;
