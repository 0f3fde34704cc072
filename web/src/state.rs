//! Application state for Axum handlers.

use carona_core::{DirectoryService, RideEnvironment, RideService};

/// Services shared across all HTTP handlers.
///
/// Both services share one [`RideEnvironment`]; cloning the state clones
/// `Arc`s only.
#[derive(Clone)]
pub struct AppState {
    /// Ride lifecycle, search and reservations
    pub rides: RideService,
    /// Users and vehicles
    pub directory: DirectoryService,
}

impl AppState {
    /// Wire both services over `env`.
    #[must_use]
    pub fn new(env: RideEnvironment) -> Self {
        Self {
            rides: RideService::new(env.clone()),
            directory: DirectoryService::new(env),
        }
    }
}
