//! Scripted distance lookups.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use carona_core::environment::DistanceService;
use carona_core::error::DistanceError;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Distance service answering from a fixed route table.
///
/// Place names are matched case-insensitively after trimming. Unknown routes
/// fall back to the default distance, or fail with
/// [`DistanceError::RouteNotFound`] when there is none.
///
/// # Example
///
/// ```
/// use carona_testing::StubDistanceService;
///
/// let distance = StubDistanceService::new()
///     .with_route("Campinas", "São Paulo", 95.3)
///     .with_default(100.0);
/// assert_eq!(distance.calls(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StubDistanceService {
    routes: Arc<RwLock<HashMap<(String, String), f64>>>,
    default_km: Option<f64>,
    failure: Option<DistanceError>,
    calls: Arc<AtomicUsize>,
}

impl StubDistanceService {
    /// Stub with no routes and no default
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `origin → destination` with `km`
    #[must_use]
    pub fn with_route(self, origin: &str, destination: &str, km: f64) -> Self {
        self.routes
            .write()
            .unwrap()
            .insert((normalize(origin), normalize(destination)), km);
        self
    }

    /// Answer unknown routes with `km`
    #[must_use]
    pub fn with_default(mut self, km: f64) -> Self {
        self.default_km = Some(km);
        self
    }

    /// Fail every lookup with `error`
    #[must_use]
    pub fn failing(error: DistanceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Number of lookups performed
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, origin: &str, destination: &str) -> Result<f64, DistanceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.routes
            .read()
            .unwrap()
            .get(&(normalize(origin), normalize(destination)))
            .copied()
            .or(self.default_km)
            .ok_or_else(|| DistanceError::RouteNotFound {
                origin: origin.to_string(),
                destination: destination.to_string(),
            })
    }
}

impl DistanceService for StubDistanceService {
    fn distance_km<'a>(
        &'a self,
        origin: &'a str,
        destination: &'a str,
    ) -> BoxFuture<'a, Result<f64, DistanceError>> {
        Box::pin(futures::future::ready(self.lookup(origin, destination)))
    }
}

fn normalize(place: &str) -> String {
    place.trim().to_lowercase()
}
