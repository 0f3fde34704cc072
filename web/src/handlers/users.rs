//! User registration.

use crate::error::AppError;
use crate::extractors::{AuthenticatedUser, JsonBody};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use carona_core::{NewUser, User};
use serde::Deserialize;

/// Body of `POST /api/users`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUserRequest {
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
}

impl From<RegisterUserRequest> for NewUser {
    fn from(request: RegisterUserRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
            phone: request.phone,
        }
    }
}

/// Register a user.
///
/// ```text
/// POST /api/users
/// {"name": "Ana Souza", "email": "ana@example.com", "phone": "+55 19 99876-5432"}
/// ```
///
/// # Errors
///
/// 422 for invalid fields, 409 when the email is taken.
pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.directory.register_user(request.into()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// The calling user.
///
/// # Errors
///
/// 401 without a user header, 404 if the user is not registered.
pub async fn current_user(
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.directory.get_user(ctx.user_id).await?))
}
