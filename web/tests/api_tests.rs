//! HTTP API tests over an in-memory deployment.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use carona_core::{DistanceError, User};
use carona_testing::{StubDistanceService, TestWorld, init_test_tracing};
use carona_web::{AppState, build_router};
use serde_json::{Value, json};

fn server(world: &TestWorld) -> TestServer {
    init_test_tracing();
    TestServer::new(build_router(AppState::new(world.env.clone()))).unwrap()
}

fn user_header(user: &User) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user.id.to_string()).unwrap(),
    )
}

fn ride_body() -> Value {
    json!({
        "origin": "Campinas",
        "destination": "São Paulo",
        "date": "2025-06-11",
        "time": "08:00",
        "seat_count": 3
    })
}

fn error_code(response: &TestResponse) -> String {
    response.json::<Value>()["code"].as_str().unwrap().to_string()
}

async fn publish(server: &TestServer, driver: &User, body: Value) -> Value {
    let (name, value) = user_header(driver);
    let response = server
        .post("/api/rides")
        .add_header(name, value)
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn test_health_and_readiness() {
    let world = TestWorld::new();
    let server = server(&world);

    server.get("/health").await.assert_json(&json!({ "status": "ok" }));
    server.get("/ready").await.assert_status_ok();

    world.store.set_unavailable(true);
    let response = server.get("/ready").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error_code(&response), "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_register_user_and_fetch_me() {
    let world = TestWorld::new();
    let server = server(&world);
    let body = json!({
        "name": "Ana Souza",
        "email": "Ana@Example.com",
        "phone": "+55 19 99876-5432"
    });

    let created = server.post("/api/users").json(&body).await;
    created.assert_status(StatusCode::CREATED);
    let user: Value = created.json();
    assert_eq!(user["email"], "ana@example.com");

    let duplicate = server.post("/api/users").json(&body).await;
    duplicate.assert_status(StatusCode::CONFLICT);
    assert_eq!(error_code(&duplicate), "CONFLICT");

    let me = server
        .get("/api/users/me")
        .add_header(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_str(user["id"].as_str().unwrap()).unwrap(),
        )
        .await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["name"], "Ana Souza");
}

#[tokio::test]
async fn test_requests_without_identity_are_unauthorized() {
    let world = TestWorld::new();
    let server = server(&world);

    let response = server.post("/api/rides").json(&ride_body()).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_publish_prices_and_joins_details() {
    let world = TestWorld::new();
    let (driver, vehicle) = world.driver("Ana").await;
    let server = server(&world);

    let ride = publish(&server, &driver, ride_body()).await;

    assert_eq!(ride["status"], "not_started");
    assert_eq!(ride["seat_count"], 3);
    // 100 km at R$0.50/km split over 3 seats
    assert_eq!(ride["price"], "16.67");
    assert_eq!(ride["passenger_ids"], json!([]));
    assert_eq!(ride["driver"]["name"], "Ana");
    assert_eq!(ride["vehicle"]["plate"], vehicle.plate);
}

#[tokio::test]
async fn test_validation_errors_are_unprocessable() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let server = server(&world);
    let (name, value) = user_header(&driver);

    let response = server
        .post("/api/rides")
        .add_header(name, value)
        .json(&json!({ "origin": "Campinas", "seat_count": 0 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_mistyped_body_is_a_validation_error() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let server = server(&world);
    let (name, value) = user_header(&driver);

    let response = server
        .post("/api/rides")
        .add_header(name, value)
        .json(&json!({
            "origin": "Campinas",
            "destination": "São Paulo",
            "date": "2025-06-11",
            "time": "08:00",
            "seat_count": "3"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response), "VALIDATION_ERROR");
    assert_eq!(world.store.ride_count(), 0);
}

#[tokio::test]
async fn test_non_json_body_is_bad_request() {
    let world = TestWorld::new();
    let server = server(&world);

    let missing = server.post("/api/users").await;
    let plain = server.post("/api/users").text("name=Ana").await;

    missing.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(error_code(&missing), "BAD_REQUEST");
    plain.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(error_code(&plain), "BAD_REQUEST");
}

#[tokio::test]
async fn test_publish_accepts_short_field_names() {
    let world = TestWorld::new();
    let (driver, vehicle) = world.driver("Ana").await;
    let server = server(&world);

    let ride = publish(
        &server,
        &driver,
        json!({
            "origin": "Campinas",
            "destination": "São Paulo",
            "date": "2025-06-11",
            "time": "08:00",
            "seats": 2,
            "vehicle": vehicle.id
        }),
    )
    .await;

    assert_eq!(ride["seat_count"], 2);
    assert_eq!(ride["vehicle"]["id"], json!(vehicle.id));
}

#[tokio::test]
async fn test_distance_failure_is_bad_gateway() {
    let world = TestWorld::with_distance(StubDistanceService::failing(
        DistanceError::RequestFailed("connection refused".to_string()),
    ));
    let (driver, _) = world.driver("Ana").await;
    let server = server(&world);
    let (name, value) = user_header(&driver);

    let response = server
        .post("/api/rides")
        .add_header(name, value)
        .json(&ride_body())
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(error_code(&response), "DISTANCE_UNAVAILABLE");
    assert_eq!(world.store.ride_count(), 0);
}

#[tokio::test]
async fn test_search_filters_by_destination_and_date() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let server = server(&world);
    publish(&server, &driver, ride_body()).await;
    let mut later = ride_body();
    later["destination"] = json!("Santos");
    later["date"] = json!("2025-06-20");
    publish(&server, &driver, later).await;

    let by_destination: Value = server
        .get("/api/rides/search")
        .add_query_param("destination", "paulo")
        .await
        .json();
    let by_date: Value = server
        .get("/api/rides/search")
        .add_query_param("date", "2025-06-15")
        .await
        .json();
    let bad_date = server
        .get("/api/rides/search")
        .add_query_param("date", "15/06/2025")
        .await;

    assert_eq!(by_destination.as_array().unwrap().len(), 1);
    assert_eq!(by_destination[0]["destination"], "São Paulo");
    assert_eq!(by_date.as_array().unwrap().len(), 1);
    assert_eq!(by_date[0]["destination"], "Santos");
    bad_date.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_reservation_conflicts() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let first = world.user("Bruno").await;
    let second = world.user("Carla").await;
    let server = server(&world);
    let mut body = ride_body();
    body["seat_count"] = json!(1);
    let ride = publish(&server, &driver, body).await;
    let path = format!("/api/rides/{}/reservations", ride["id"].as_str().unwrap());

    let (name, value) = user_header(&first);
    let booked = server.post(&path).add_header(name.clone(), value.clone()).await;
    let again = server.post(&path).add_header(name, value).await;
    let (name, value) = user_header(&second);
    let full = server.post(&path).add_header(name, value).await;
    let (name, value) = user_header(&driver);
    let own = server.post(&path).add_header(name, value).await;

    booked.assert_status(StatusCode::CREATED);
    assert_eq!(booked.json::<Value>()["passenger_ids"], json!([first.id]));
    again.assert_status(StatusCode::CONFLICT);
    assert_eq!(error_code(&again), "ALREADY_RESERVED");
    full.assert_status(StatusCode::CONFLICT);
    assert_eq!(error_code(&full), "RIDE_FULL");
    own.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(error_code(&own), "FORBIDDEN");
}

#[tokio::test]
async fn test_cancel_reservation_and_reserved_list() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let passenger = world.user("Bruno").await;
    let server = server(&world);
    let ride = publish(&server, &driver, ride_body()).await;
    let path = format!("/api/rides/{}/reservations", ride["id"].as_str().unwrap());
    let (name, value) = user_header(&passenger);

    server
        .post(&path)
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::CREATED);
    let reserved: Value = server
        .get("/api/rides/reserved")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    let cancelled = server.delete(&path).add_header(name.clone(), value.clone()).await;
    let after: Value = server
        .get("/api/rides/reserved")
        .add_header(name, value)
        .await
        .json();

    assert_eq!(reserved.as_array().unwrap().len(), 1);
    cancelled.assert_status_ok();
    assert_eq!(cancelled.json::<Value>()["passenger_ids"], json!([]));
    assert_eq!(after, json!([]));
}

#[tokio::test]
async fn test_only_driver_may_edit() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let stranger = world.user("Bruno").await;
    let server = server(&world);
    let ride = publish(&server, &driver, ride_body()).await;
    let path = format!("/api/rides/{}", ride["id"].as_str().unwrap());

    let (name, value) = user_header(&stranger);
    let forbidden = server
        .put(&path)
        .add_header(name, value)
        .json(&json!({ "time": "09:30" }))
        .await;
    let (name, value) = user_header(&driver);
    let edited = server
        .put(&path)
        .add_header(name, value)
        .json(&json!({ "time": "09:30" }))
        .await;

    forbidden.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(error_code(&forbidden), "FORBIDDEN");
    edited.assert_status_ok();
    assert_eq!(edited.json::<Value>()["time"], "09:30:00");
}

#[tokio::test]
async fn test_only_driver_may_start_or_complete() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let stranger = world.user("Bruno").await;
    let server = server(&world);
    let ride = publish(&server, &driver, ride_body()).await;
    let id = ride["id"].as_str().unwrap().to_string();
    let (stranger_name, stranger_value) = user_header(&stranger);
    let (driver_name, driver_value) = user_header(&driver);

    let start = server
        .post(&format!("/api/rides/{id}/start"))
        .add_header(stranger_name.clone(), stranger_value.clone())
        .await;
    let still_open = server.get(&format!("/api/rides/{id}")).await;
    server
        .post(&format!("/api/rides/{id}/start"))
        .add_header(driver_name, driver_value)
        .await
        .assert_status_ok();
    let complete = server
        .post(&format!("/api/rides/{id}/complete"))
        .add_header(stranger_name, stranger_value)
        .await;
    let still_running = server.get(&format!("/api/rides/{id}")).await;

    start.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(error_code(&start), "FORBIDDEN");
    assert_eq!(still_open.json::<Value>()["status"], "not_started");
    complete.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(error_code(&complete), "FORBIDDEN");
    assert_eq!(still_running.json::<Value>()["status"], "in_progress");
}

#[tokio::test]
async fn test_lifecycle_start_complete_delete() {
    let world = TestWorld::new();
    let (driver, _) = world.driver("Ana").await;
    let server = server(&world);
    let ride = publish(&server, &driver, ride_body()).await;
    let id = ride["id"].as_str().unwrap().to_string();
    let (name, value) = user_header(&driver);

    let started = server
        .post(&format!("/api/rides/{id}/start"))
        .add_header(name.clone(), value.clone())
        .await;
    let completed = server
        .post(&format!("/api/rides/{id}/complete"))
        .add_header(name.clone(), value.clone())
        .await;
    let again = server
        .post(&format!("/api/rides/{id}/complete"))
        .add_header(name.clone(), value.clone())
        .await;
    let deleted = server
        .delete(&format!("/api/rides/{id}"))
        .add_header(name, value)
        .await;
    let gone = server.get(&format!("/api/rides/{id}")).await;

    assert_eq!(started.json::<Value>()["status"], "in_progress");
    assert_eq!(completed.json::<Value>()["status"], "completed");
    again.assert_status(StatusCode::CONFLICT);
    assert_eq!(error_code(&again), "INVALID_TRANSITION");
    deleted.assert_status(StatusCode::NO_CONTENT);
    gone.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_ride_id_is_bad_request() {
    let world = TestWorld::new();
    let server = server(&world);

    let response = server.get("/api/rides/not-a-uuid").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "BAD_REQUEST");
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let world = TestWorld::new();
    let server = server(&world);
    let correlation = "6f1c1f5e-8d1f-4c55-9a55-0c1d2e3f4a5b";

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-correlation-id"),
            HeaderValue::from_static(correlation),
        )
        .await;

    assert_eq!(response.header("x-correlation-id"), correlation);
}
