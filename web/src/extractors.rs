//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request correlation ID (from the middleware, the
//!   `X-Correlation-ID` header, or freshly generated)
//! - [`AuthenticatedUser`]: the requester's [`ActorContext`], built from the
//!   `X-User-Id` header set by the authenticating gateway
//! - [`JsonBody`]: `Json<T>` whose rejections render as [`AppError`]
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     State(state): State<AppState>,
//!     AuthenticatedUser(ctx): AuthenticatedUser,
//! ) -> Result<Json<Vec<RideDetails>>, AppError> {
//!     Ok(Json(state.rides.list_driver_rides(&ctx).await?))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use carona_core::{ActorContext, UserId};
use uuid::Uuid;

/// Header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "X-User-Id";

fn correlation_id(parts: &Parts) -> Uuid {
    parts
        .extensions
        .get::<Uuid>()
        .copied()
        .or_else(|| {
            parts
                .headers
                .get(CORRELATION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| Uuid::parse_str(s).ok())
        })
        .unwrap_or_else(Uuid::new_v4)
}

/// Correlation ID for request tracing.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(correlation_id(parts)))
    }
}

/// The authenticated requester.
///
/// Rejects with 401 when `X-User-Id` is missing or not a UUID. Whether the
/// user is registered is checked by the operations that need it.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub ActorContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::unauthorized("missing X-User-Id header"))?;

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(UserId::from_uuid)
            .ok_or_else(|| AppError::unauthorized("X-User-Id is not a valid user id"))?;

        Ok(Self(
            ActorContext::new(user_id).with_correlation_id(correlation_id(parts)),
        ))
    }
}

/// JSON request body.
///
/// Same as [`Json`], but malformed bodies are rejected with the
/// `{"code", "message"}` error body instead of plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
