//! Router composition.

use crate::handlers::{health, rides, users, vehicles};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the full HTTP surface.
///
/// # Routes
///
/// ## Probes
/// - `GET /health` - liveness
/// - `GET /ready` - readiness (store ping)
///
/// ## Users and vehicles
/// - `POST /api/users` - register
/// - `GET /api/users/me` - the caller
/// - `POST /api/vehicles`, `GET /api/vehicles` - register / list own
///
/// ## Rides
/// - `POST /api/rides` - publish, `GET /api/rides` - rides the caller drives
/// - `GET /api/rides/search` - open rides by `origin`, `destination`, `date`
/// - `GET /api/rides/reserved` - rides the caller has a seat on
/// - `GET|PUT|DELETE /api/rides/:id`
/// - `POST /api/rides/:id/start`, `POST /api/rides/:id/complete`
/// - `POST|DELETE /api/rides/:id/reservations` - reserve / cancel a seat
///
/// Every route runs inside the correlation-ID middleware and a `TraceLayer`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Users
        .route("/users", post(users::register_user))
        .route("/users/me", get(users::current_user))

        // Vehicles
        .route(
            "/vehicles",
            post(vehicles::register_vehicle).get(vehicles::list_vehicles),
        )

        // Rides
        .route("/rides", post(rides::create_ride).get(rides::list_driver_rides))
        .route("/rides/search", get(rides::search_rides))
        .route("/rides/reserved", get(rides::list_reserved_rides))
        .route(
            "/rides/:id",
            get(rides::get_ride)
                .put(rides::update_ride)
                .delete(rides::delete_ride),
        )
        .route("/rides/:id/start", post(rides::start_ride))
        .route("/rides/:id/complete", post(rides::complete_ride))
        .route(
            "/rides/:id/reservations",
            post(rides::reserve_seat).delete(rides::cancel_reservation),
        )
}
