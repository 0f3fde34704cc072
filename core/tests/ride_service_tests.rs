//! End-to-end ride flows against the in-memory store.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use carona_core::{
    ActorContext, DistanceError, Price, RideChanges, RideDraft, RideError, RideQuery, RideStatus,
    UserId,
};
use carona_testing::{StubDistanceService, TestWorld, as_user, draft};
use chrono::NaiveDate;

#[tokio::test]
async fn test_create_ride_prices_route_and_joins_details() {
    let world = TestWorld::with_distance(
        StubDistanceService::new().with_route("Campinas", "São Paulo", 95.34),
    );
    let (driver, vehicle) = world.driver("Ana").await;

    let details = world
        .rides()
        .create_ride(&as_user(&driver), draft())
        .await
        .expect("ride should be created");

    let ride = &details.ride;
    assert_eq!(ride.driver_id, driver.id);
    assert_eq!(ride.vehicle_id, vehicle.id);
    assert_eq!(ride.status, RideStatus::NotStarted);
    assert!(ride.passenger_ids.is_empty());
    assert!((ride.distance_km - 95.3).abs() < 1e-9);
    // 95.3 km * 50 cents / 3 seats = 1588.33
    assert_eq!(ride.price, Price::from_cents(1588));
    assert_eq!(details.driver.name, "Ana");
    assert_eq!(details.vehicle.plate, vehicle.plate);
    assert_eq!(world.store.ride_count(), 1);
}

#[tokio::test]
async fn test_create_ride_requires_registered_driver() {
    let world = TestWorld::new();

    let result = world
        .rides()
        .create_ride(&ActorContext::new(UserId::new()), draft())
        .await;

    assert!(matches!(result, Err(RideError::NotFound { resource: "User", .. })));
}

#[tokio::test]
async fn test_invalid_draft_stores_nothing_and_skips_lookup() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;

    let result = world
        .rides()
        .create_ride(
            &as_user(&driver),
            RideDraft {
                seat_count: Some(0),
                ..draft()
            },
        )
        .await;

    assert!(matches!(result, Err(RideError::Validation(_))));
    assert_eq!(world.store.ride_count(), 0);
    assert_eq!(world.distance.calls(), 0);
}

#[tokio::test]
async fn test_driver_without_vehicle_cannot_publish() {
    let world = TestWorld::new();
    let driver = world.user("Ana").await;

    let result = world.rides().create_ride(&as_user(&driver), draft()).await;

    assert!(matches!(result, Err(RideError::VehicleSelection(_))));
}

#[tokio::test]
async fn test_driver_with_two_vehicles_must_choose() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let second = world.vehicle(&driver).await;

    let ambiguous = world.rides().create_ride(&as_user(&driver), draft()).await;
    assert!(matches!(ambiguous, Err(RideError::VehicleSelection(_))));

    let chosen = world
        .rides()
        .create_ride(
            &as_user(&driver),
            RideDraft {
                vehicle_id: Some(second.id),
                ..draft()
            },
        )
        .await
        .unwrap();
    assert_eq!(chosen.ride.vehicle_id, second.id);
}

#[tokio::test]
async fn test_distance_failure_stores_nothing() {
    let world = TestWorld::with_distance(StubDistanceService::failing(
        DistanceError::RequestFailed("connection refused".to_string()),
    ));
    let (driver, _) = world.driver("Ana").await;

    let result = world.rides().create_ride(&as_user(&driver), draft()).await;

    assert!(matches!(result, Err(RideError::DistanceUnavailable(_))));
    assert_eq!(world.store.ride_count(), 0);
}

#[tokio::test]
async fn test_reserve_and_cancel_seat() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let passenger = world.user("Bruno").await;
    let ride = world.publish(&driver, 2).await;
    let rides = world.rides();

    let booked = rides.reserve_seat(&as_user(&passenger), ride.id).await.unwrap();
    assert_eq!(booked.passenger_ids, vec![passenger.id]);

    let again = rides.reserve_seat(&as_user(&passenger), ride.id).await;
    assert!(matches!(again, Err(RideError::AlreadyReserved { .. })));

    let reserved = rides.list_reserved_rides(&as_user(&passenger)).await.unwrap();
    assert_eq!(reserved.len(), 1);
    assert_eq!(reserved[0].ride.id, ride.id);

    let cancelled = rides.cancel_reservation(&as_user(&passenger), ride.id).await.unwrap();
    assert!(cancelled.passenger_ids.is_empty());

    // Cancelling again is a no-op
    let unchanged = rides.cancel_reservation(&as_user(&passenger), ride.id).await.unwrap();
    assert!(unchanged.passenger_ids.is_empty());
}

#[tokio::test]
async fn test_full_ride_rejects_reservation() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let first = world.user("Bruno").await;
    let second = world.user("Carla").await;
    let ride = world.publish(&driver, 1).await;

    world.rides().reserve_seat(&as_user(&first), ride.id).await.unwrap();
    let result = world.rides().reserve_seat(&as_user(&second), ride.id).await;

    assert!(matches!(result, Err(RideError::Full { seat_count: 1, .. })));
    assert_eq!(world.store.ride(ride.id).unwrap().passenger_ids, vec![first.id]);
}

#[tokio::test]
async fn test_driver_cannot_reserve_own_ride() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let ride = world.publish(&driver, 2).await;

    let result = world.rides().reserve_seat(&as_user(&driver), ride.id).await;

    assert!(matches!(result, Err(RideError::Forbidden(_))));
}

#[tokio::test]
async fn test_reserve_unknown_ride() {
    let world = TestWorld::new();
    let passenger = world.user("Bruno").await;

    let result = world
        .rides()
        .reserve_seat(&as_user(&passenger), carona_core::RideId::new())
        .await;

    assert!(matches!(result, Err(RideError::NotFound { resource: "Ride", .. })));
}

#[tokio::test]
async fn test_started_ride_accepts_no_reservations() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let passenger = world.user("Bruno").await;
    let ride = world.publish(&driver, 2).await;

    world.rides().start_ride(&as_user(&driver), ride.id).await.unwrap();
    let result = world.rides().reserve_seat(&as_user(&passenger), ride.id).await;

    assert!(matches!(
        result,
        Err(RideError::RideClosed {
            status: RideStatus::InProgress,
            ..
        })
    ));
}

#[tokio::test]
async fn test_lifecycle_runs_forward_only() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let passenger = world.user("Bruno").await;
    let ride = world.publish(&driver, 2).await;
    let rides = world.rides();
    let ctx = as_user(&driver);

    let premature = rides.complete_ride(&ctx, ride.id).await;
    assert!(matches!(premature, Err(RideError::InvalidTransition { .. })));

    let stranger = rides.start_ride(&as_user(&passenger), ride.id).await;
    assert!(matches!(stranger, Err(RideError::Forbidden(_))));

    let started = rides.start_ride(&ctx, ride.id).await.unwrap();
    assert_eq!(started.status, RideStatus::InProgress);

    let completed = rides.complete_ride(&ctx, ride.id).await.unwrap();
    assert_eq!(completed.status, RideStatus::Completed);

    let restart = rides.start_ride(&ctx, ride.id).await;
    assert!(matches!(
        restart,
        Err(RideError::InvalidTransition {
            from: RideStatus::Completed,
            ..
        })
    ));

    let cancel = rides.cancel_reservation(&as_user(&passenger), ride.id).await;
    assert!(matches!(cancel, Err(RideError::RideClosed { .. })));
}

#[tokio::test]
async fn test_update_reprices_and_keeps_passengers() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let passenger = world.user("Bruno").await;
    let ride = world.publish(&driver, 3).await;
    let rides = world.rides();
    rides.reserve_seat(&as_user(&passenger), ride.id).await.unwrap();

    let updated = rides
        .update_ride(
            &as_user(&driver),
            ride.id,
            RideChanges {
                seat_count: Some(4),
                ..RideChanges::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.seat_count, 4);
    assert_eq!(updated.passenger_ids, vec![passenger.id]);
    // 100 km * 50 cents / 4 seats
    assert_eq!(updated.price, Price::from_cents(1250));
    assert_eq!(world.distance.calls(), 2);
}

#[tokio::test]
async fn test_update_cannot_strand_passengers() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let ride = world.publish(&driver, 2).await;
    let rides = world.rides();
    for name in ["Bruno", "Carla"] {
        let passenger = world.user(name).await;
        rides.reserve_seat(&as_user(&passenger), ride.id).await.unwrap();
    }

    let result = rides
        .update_ride(
            &as_user(&driver),
            ride.id,
            RideChanges {
                seat_count: Some(1),
                ..RideChanges::default()
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(RideError::SeatsBelowPassengers {
            passengers: 2,
            requested: 1,
            ..
        })
    ));
}

#[tokio::test]
async fn test_only_driver_updates_or_deletes() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let other = world.user("Bruno").await;
    let ride = world.publish(&driver, 2).await;
    let rides = world.rides();

    let update = rides
        .update_ride(
            &as_user(&other),
            ride.id,
            RideChanges {
                origin: Some("Jundiaí".to_string()),
                ..RideChanges::default()
            },
        )
        .await;
    assert!(matches!(update, Err(RideError::Forbidden(_))));

    let delete = rides.delete_ride(&as_user(&other), ride.id).await;
    assert!(matches!(delete, Err(RideError::Forbidden(_))));

    rides.delete_ride(&as_user(&driver), ride.id).await.unwrap();
    assert_eq!(world.store.ride_count(), 0);

    let missing = rides.get_ride(ride.id).await;
    assert!(matches!(missing, Err(RideError::NotFound { .. })));
}

#[tokio::test]
async fn test_only_driver_starts_or_completes() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let other = world.user("Bruno").await;
    let ride = world.publish(&driver, 2).await;
    let rides = world.rides();

    let start = rides.start_ride(&as_user(&other), ride.id).await;
    assert!(matches!(start, Err(RideError::Forbidden(_))));
    assert_eq!(world.store.ride(ride.id).unwrap().status, RideStatus::NotStarted);

    rides.start_ride(&as_user(&driver), ride.id).await.unwrap();

    let complete = rides.complete_ride(&as_user(&other), ride.id).await;
    assert!(matches!(complete, Err(RideError::Forbidden(_))));
    assert_eq!(world.store.ride(ride.id).unwrap().status, RideStatus::InProgress);

    let completed = rides.complete_ride(&as_user(&driver), ride.id).await.unwrap();
    assert_eq!(completed.status, RideStatus::Completed);
}

#[tokio::test]
async fn test_search_filters_and_orders() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let rides = world.rides();
    let ctx = as_user(&driver);

    let later = rides
        .create_ride(
            &ctx,
            RideDraft {
                date: Some("2025-06-15".to_string()),
                ..draft()
            },
        )
        .await
        .unwrap();
    let sooner = rides.create_ride(&ctx, draft()).await.unwrap();
    let elsewhere = rides
        .create_ride(
            &ctx,
            RideDraft {
                destination: Some("Sorocaba".to_string()),
                ..draft()
            },
        )
        .await
        .unwrap();

    let found = rides
        .search_rides(&RideQuery {
            origin: Some("  campinas ".to_string()),
            destination: Some("paulo".to_string()),
            date: None,
        })
        .await
        .unwrap();
    let ids: Vec<_> = found.iter().map(|details| details.ride.id).collect();
    assert_eq!(ids, vec![sooner.ride.id, later.ride.id]);

    let from_date = rides
        .search_rides(&RideQuery {
            date: NaiveDate::from_ymd_opt(2025, 6, 12),
            ..RideQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(from_date.len(), 1);
    assert_eq!(from_date[0].ride.id, later.ride.id);

    // Completed rides drop out of search
    rides.start_ride(&ctx, elsewhere.ride.id).await.unwrap();
    rides.complete_ride(&ctx, elsewhere.ride.id).await.unwrap();
    let everything = rides.search_rides(&RideQuery::default()).await.unwrap();
    assert_eq!(everything.len(), 2);

    let mine = rides.list_driver_rides(&ctx).await.unwrap();
    assert_eq!(mine.len(), 3);
    assert_eq!(mine[0].ride.id, later.ride.id);
}

#[tokio::test]
async fn test_storage_failure_surfaces_as_store_error() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    world.store.set_unavailable(true);

    let result = world.rides().list_driver_rides(&as_user(&driver)).await;

    assert!(matches!(result, Err(RideError::Store(_))));
}
