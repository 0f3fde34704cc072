//! Distance-matrix HTTP client.

use crate::response::MatrixResponse;
use carona_core::environment::DistanceService;
use carona_core::error::DistanceError;
use futures::future::BoxFuture;
use reqwest::Client;
use std::time::Duration;

/// Default endpoint (Google Distance Matrix JSON API)
pub const DEFAULT_API_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Connection settings for [`HttpDistanceService`].
#[derive(Debug, Clone)]
pub struct DistanceConfig {
    /// Full endpoint URL, queried with `GET`
    pub base_url: String,
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl DistanceConfig {
    /// Config for the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Point at another endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`DistanceService`] backed by a Distance-Matrix style HTTP API.
#[derive(Clone)]
pub struct HttpDistanceService {
    client: Client,
    config: DistanceConfig,
}

impl std::fmt::Debug for HttpDistanceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDistanceService")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpDistanceService {
    /// Create a client from config.
    ///
    /// # Errors
    ///
    /// Returns `DistanceError::RequestFailed` if the HTTP client cannot be built
    pub fn new(config: DistanceConfig) -> Result<Self, DistanceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DistanceError::RequestFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Look up the driving distance between two places in kilometers.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, timeouts, API errors, unknown
    /// routes, or parsing failures
    #[tracing::instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn lookup(&self, origin: &str, destination: &str) -> Result<f64, DistanceError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("origins", origin),
                ("destinations", destination),
                ("key", self.config.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| DistanceError::RequestFailed(e.to_string()))?;

        let body = match response.status() {
            status if status.is_success() => response
                .json::<MatrixResponse>()
                .await
                .map_err(|e| DistanceError::InvalidResponse(e.to_string()))?,
            status => {
                let message = response.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), "distance API returned an error status");
                return Err(DistanceError::ApiError {
                    status: status.as_u16(),
                    message,
                });
            }
        };

        let km = body.first_distance_km(origin, destination)?;
        tracing::debug!(km, "distance resolved");
        Ok(km)
    }
}

impl DistanceService for HttpDistanceService {
    fn distance_km<'a>(
        &'a self,
        origin: &'a str,
        destination: &'a str,
    ) -> BoxFuture<'a, Result<f64, DistanceError>> {
        Box::pin(self.lookup(origin, destination))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DistanceConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let service = HttpDistanceService::new(DistanceConfig::new("secret-key")).unwrap();
        assert!(!format!("{service:?}").contains("secret-key"));
    }
}
