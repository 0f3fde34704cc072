//! Axum HTTP surface for Carona.
//!
//! Handlers are a thin imperative shell: they extract the caller and the
//! request body, call [`RideService`](carona_core::RideService) or
//! [`DirectoryService`](carona_core::DirectoryService), and map
//! [`RideError`](carona_core::RideError)s to HTTP responses via [`AppError`].
//!
//! # Request Flow
//!
//! 1. **Correlation middleware** assigns an ID and opens an `http_request` span
//! 2. **Extractors** build the [`ActorContext`](carona_core::ActorContext)
//!    from `X-User-Id` (401 when missing)
//! 3. **Handler** calls the service
//! 4. **Result** is rendered as JSON, errors as `{"code", "message"}`
//!
//! # Example
//!
//! ```ignore
//! use carona_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(environment));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{AuthenticatedUser, CorrelationId, JsonBody, USER_ID_HEADER};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;
