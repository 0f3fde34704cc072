//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::error::AppError;
use crate::state::AppState;
use axum::{Json, extract::State};
use serde_json::{Value, json};

/// Liveness: the process is up. Does not touch dependencies.
///
/// ```text
/// GET /health  →  200 {"status": "ok"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness: the ride store answers.
///
/// ```text
/// GET /ready  →  200 {"status": "ready"} | 503
/// ```
///
/// # Errors
///
/// Returns 503 when the store ping fails.
pub async fn readiness(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state
        .rides
        .environment()
        .rides
        .ping()
        .await
        .map_err(|e| {
            AppError::unavailable("storage is unreachable").with_source(anyhow::Error::new(e))
        })?;

    Ok(Json(json!({ "status": "ready" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let Json(body) = health_check().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }
}
