//! Error types for web handlers.
//!
//! [`AppError`] bridges domain errors and HTTP responses. Every failure is
//! rendered as `{"code": ..., "message": ...}` with the status from the
//! table below.
//!
//! | Domain error | Status | Code |
//! |---|---|---|
//! | `Validation` | 422 | `VALIDATION_ERROR` |
//! | `VehicleSelection` | 422 | `VEHICLE_SELECTION_ERROR` |
//! | `NotFound` | 404 | `NOT_FOUND` |
//! | `Forbidden` | 403 | `FORBIDDEN` |
//! | `AlreadyReserved` | 409 | `ALREADY_RESERVED` |
//! | `Full` | 409 | `RIDE_FULL` |
//! | `RideClosed` | 409 | `RIDE_CLOSED` |
//! | `InvalidTransition` | 409 | `INVALID_TRANSITION` |
//! | `SeatsBelowPassengers` | 409 | `SEATS_BELOW_PASSENGERS` |
//! | `Conflict` | 409 | `CONFLICT` |
//! | `DistanceUnavailable` | 502 | `DISTANCE_UNAVAILABLE` |
//! | `Store` | 500 | `INTERNAL_SERVER_ERROR` |

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use carona_core::RideError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Ride>, AppError> {
///     let ride = state.rides.get_ride(ride_id).await?;
///     Ok(Json(ride))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code of this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_SERVER_ERROR")
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message, "SERVICE_UNAVAILABLE")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<RideError> for AppError {
    fn from(err: RideError) -> Self {
        let message = err.to_string();
        match err {
            RideError::Validation(_) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "VALIDATION_ERROR")
            }
            RideError::VehicleSelection(_) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                message,
                "VEHICLE_SELECTION_ERROR",
            ),
            RideError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND"),
            RideError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN"),
            RideError::AlreadyReserved { .. } => {
                Self::new(StatusCode::CONFLICT, message, "ALREADY_RESERVED")
            }
            RideError::Full { .. } => Self::new(StatusCode::CONFLICT, message, "RIDE_FULL"),
            RideError::RideClosed { .. } => Self::new(StatusCode::CONFLICT, message, "RIDE_CLOSED"),
            RideError::InvalidTransition { .. } => {
                Self::new(StatusCode::CONFLICT, message, "INVALID_TRANSITION")
            }
            RideError::SeatsBelowPassengers { .. } => {
                Self::new(StatusCode::CONFLICT, message, "SEATS_BELOW_PASSENGERS")
            }
            RideError::Conflict(_) => Self::new(StatusCode::CONFLICT, message, "CONFLICT"),
            RideError::DistanceUnavailable(source) => Self::new(
                StatusCode::BAD_GATEWAY,
                "route distance is unavailable, try again later",
                "DISTANCE_UNAVAILABLE",
            )
            .with_source(anyhow::Error::new(source)),
            RideError::Store(source) => Self::internal("An internal error occurred")
                .with_source(anyhow::Error::new(source)),
        }
    }
}

/// Request bodies that fail to parse keep axum's status. Well-formed JSON
/// with wrong field types (422) is a validation failure, everything else
/// (syntax, missing or wrong content type) is a bad request.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        let code = if status == StatusCode::UNPROCESSABLE_ENTITY {
            "VALIDATION_ERROR"
        } else {
            "BAD_REQUEST"
        };
        Self::new(status, rejection.body_text(), code)
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Request failed"
                );
            }
        } else {
            tracing::debug!(status = %self.status, code = self.code, message = %self.message, "Request rejected");
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}
