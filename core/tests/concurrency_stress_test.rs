//! Concurrency stress tests for last-seat scenarios.
//!
//! Many passengers race for a few seats through the shared service; the
//! store must admit exactly `seat_count` of them and never duplicate or
//! overbook.
//!
//! Run with: `cargo test --test concurrency_stress_test -- --nocapture`

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/expect

use carona_core::{RideError, UserId};
use carona_testing::{TestWorld, as_user};
use std::collections::HashSet;
use std::sync::Arc;

/// 50 concurrent reservation attempts for 1 seat.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_last_seat_concurrency_50_requests() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let ride = world.publish(&driver, 1).await;
    let ride_id = ride.id;
    let rides = Arc::new(world.rides());

    let mut passengers = Vec::new();
    for i in 0..50 {
        passengers.push(world.user(&format!("Passenger {i}")).await);
    }

    let handles: Vec<_> = passengers
        .iter()
        .map(|passenger| {
            let rides = Arc::clone(&rides);
            let ctx = as_user(passenger);
            tokio::spawn(async move { rides.reserve_seat(&ctx, ride_id).await })
        })
        .collect();

    let mut successes = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.expect("task should not panic") {
            Ok(_) => successes += 1,
            Err(RideError::Full { .. }) => full += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    println!("  ✅ {successes} succeeded, {full} rejected as full");
    assert_eq!(successes, 1, "exactly one passenger gets the last seat");
    assert_eq!(full, 49);
    assert_eq!(world.store.ride(ride_id).unwrap().passenger_ids.len(), 1);
}

/// Same passenger retrying concurrently never holds two seats.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_reservations_race() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let passenger = world.user("Bruno").await;
    let ride = world.publish(&driver, 4).await;
    let ride_id = ride.id;
    let rides = Arc::new(world.rides());

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let rides = Arc::clone(&rides);
            let ctx = as_user(&passenger);
            tokio::spawn(async move { rides.reserve_seat(&ctx, ride_id).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(error) => assert!(matches!(error, RideError::AlreadyReserved { .. })),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(
        world.store.ride(ride_id).unwrap().passenger_ids,
        vec![passenger.id]
    );
}

/// Seats fill exactly to capacity under contention, with every admitted
/// passenger distinct.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_capacity_never_exceeded() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let ride = world.publish(&driver, 4).await;
    let ride_id = ride.id;
    let rides = Arc::new(world.rides());

    let mut passengers = Vec::new();
    for i in 0..30 {
        passengers.push(world.user(&format!("Passenger {i}")).await);
    }

    // Each passenger tries twice at once
    let attempts: Vec<_> = passengers
        .iter()
        .flat_map(|passenger| [as_user(passenger), as_user(passenger)])
        .collect();

    let handles: Vec<_> = attempts
        .into_iter()
        .map(|ctx| {
            let rides = Arc::clone(&rides);
            tokio::spawn(async move { rides.reserve_seat(&ctx, ride_id).await })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        if let Ok(booked) = handle.await.unwrap() {
            winners.push(booked);
        }
    }

    let stored = world.store.ride(ride_id).unwrap();
    let unique: HashSet<UserId> = stored.passenger_ids.iter().copied().collect();
    assert_eq!(winners.len(), 4);
    assert_eq!(stored.passenger_ids.len(), 4);
    assert_eq!(unique.len(), 4);
}
