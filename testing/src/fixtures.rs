//! Ready-made test world: in-memory stores, stub distances and a fixed clock
//! wired into a [`RideEnvironment`].

#![allow(clippy::unwrap_used)] // Fixtures fail loudly
#![allow(clippy::missing_panics_doc)]

use crate::distance::StubDistanceService;
use crate::memory::InMemoryStore;
use crate::mocks::FixedClock;
use carona_core::context::ActorContext;
use carona_core::directory::DirectoryService;
use carona_core::environment::RideEnvironment;
use carona_core::service::RideService;
use carona_core::types::{Ride, User, Vehicle};
use carona_core::validation::{NewUser, NewVehicle, RideDraft};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Distance every unknown route resolves to in a default [`TestWorld`].
pub const DEFAULT_ROUTE_KM: f64 = 100.0;

/// 2025-06-10 09:00 in São Paulo.
#[must_use]
pub fn world_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-10T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A complete in-memory deployment of the ride services.
#[derive(Clone)]
pub struct TestWorld {
    /// Shared store backing rides, vehicles and users
    pub store: Arc<InMemoryStore>,
    /// Scripted distances
    pub distance: Arc<StubDistanceService>,
    /// Wired environment
    pub env: RideEnvironment,
    sequence: Arc<AtomicU32>,
}

impl TestWorld {
    /// World at [`world_time`] where every route is [`DEFAULT_ROUTE_KM`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_distance(StubDistanceService::new().with_default(DEFAULT_ROUTE_KM))
    }

    /// World at [`world_time`] using `distance` for route lookups.
    #[must_use]
    pub fn with_distance(distance: StubDistanceService) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let distance = Arc::new(distance);
        let env = RideEnvironment::new(
            Arc::new(FixedClock::new(world_time())),
            store.clone(),
            store.clone(),
            store.clone(),
            distance.clone(),
        );
        Self {
            store,
            distance,
            env,
            sequence: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Ride service over this world
    #[must_use]
    pub fn rides(&self) -> RideService {
        RideService::new(self.env.clone())
    }

    /// Directory service over this world
    #[must_use]
    pub fn directory(&self) -> DirectoryService {
        DirectoryService::new(self.env.clone())
    }

    /// Register a user with a unique email
    pub async fn user(&self, name: &str) -> User {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.directory()
            .register_user(NewUser {
                name: Some(name.to_string()),
                email: Some(format!("user{n}@example.com")),
                phone: Some(format!("1999{n:07}")),
            })
            .await
            .unwrap()
    }

    /// Register a vehicle with a unique plate for `owner`
    pub async fn vehicle(&self, owner: &User) -> Vehicle {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.directory()
            .register_vehicle(
                &ActorContext::new(owner.id),
                NewVehicle {
                    brand: Some("Fiat".to_string()),
                    model: Some("Argo".to_string()),
                    year: Some(2021),
                    color: Some("Vermelho".to_string()),
                    plate: Some(format!("TST{:04}", n % 10_000)),
                },
            )
            .await
            .unwrap()
    }

    /// Register a user owning exactly one vehicle
    pub async fn driver(&self, name: &str) -> (User, Vehicle) {
        let user = self.user(name).await;
        let vehicle = self.vehicle(&user).await;
        (user, vehicle)
    }

    /// Publish [`draft`] with `seat_count` seats as `driver`
    pub async fn publish(&self, driver: &User, seat_count: i64) -> Ride {
        self.rides()
            .create_ride(
                &ActorContext::new(driver.id),
                RideDraft {
                    seat_count: Some(seat_count),
                    ..draft()
                },
            )
            .await
            .unwrap()
            .ride
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Campinas → São Paulo tomorrow (relative to [`world_time`]) at 08:00 with
/// three seats.
#[must_use]
pub fn draft() -> RideDraft {
    RideDraft {
        origin: Some("Campinas".to_string()),
        destination: Some("São Paulo".to_string()),
        date: Some("2025-06-11".to_string()),
        time: Some("08:00".to_string()),
        seat_count: Some(3),
        vehicle_id: None,
    }
}

/// Context acting as `user`
#[must_use]
pub fn as_user(user: &User) -> ActorContext {
    ActorContext::new(user.id)
}
