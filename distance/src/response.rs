//! Distance-matrix response body.

use carona_core::error::DistanceError;
use serde::Deserialize;

/// Top-level response.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixResponse {
    /// `OK` or an error code such as `REQUEST_DENIED`
    pub status: String,
    /// Human-readable detail accompanying an error status
    #[serde(default)]
    pub error_message: Option<String>,
    /// One row per origin
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

/// Results for one origin.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixRow {
    /// One element per destination
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

/// Result for one origin/destination pair.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixElement {
    /// `OK`, `NOT_FOUND` or `ZERO_RESULTS`
    pub status: String,
    /// Present when `status` is `OK`
    #[serde(default)]
    pub distance: Option<TextValue>,
}

/// A measured quantity.
#[derive(Debug, Clone, Deserialize)]
pub struct TextValue {
    /// Value in base units (meters)
    pub value: f64,
    /// Localized display text
    #[serde(default)]
    pub text: Option<String>,
}

impl MatrixResponse {
    /// Distance of the first origin/destination pair in kilometers.
    ///
    /// # Errors
    ///
    /// - [`DistanceError::ApiError`] when the top-level status is not `OK`
    /// - [`DistanceError::RouteNotFound`] when the element status is not `OK`
    /// - [`DistanceError::InvalidResponse`] when the element or its distance
    ///   is missing
    pub fn first_distance_km(&self, origin: &str, destination: &str) -> Result<f64, DistanceError> {
        if self.status != "OK" {
            return Err(DistanceError::ApiError {
                status: 200,
                message: match &self.error_message {
                    Some(detail) => format!("{}: {detail}", self.status),
                    None => self.status.clone(),
                },
            });
        }

        let element = self
            .rows
            .first()
            .and_then(|row| row.elements.first())
            .ok_or_else(|| DistanceError::InvalidResponse("response has no elements".to_string()))?;

        if element.status != "OK" {
            return Err(DistanceError::RouteNotFound {
                origin: origin.to_string(),
                destination: destination.to_string(),
            });
        }

        let meters = element
            .distance
            .as_ref()
            .map(|distance| distance.value)
            .filter(|meters| meters.is_finite() && *meters >= 0.0)
            .ok_or_else(|| DistanceError::InvalidResponse("element has no distance".to_string()))?;

        Ok(meters / 1000.0)
    }
}
