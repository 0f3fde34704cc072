//! Domain types for the ride sharing system.
//!
//! Identifiers, the `Ride` aggregate, the vehicles and users it references,
//! and the joined read model returned by ride search.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a ride
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RideId(Uuid);

impl RideId {
    /// Creates a new random `RideId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RideId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RideId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user (driver or passenger)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a vehicle
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(Uuid);

impl VehicleId {
    /// Creates a new random `VehicleId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `VehicleId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VehicleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// Lifecycle status of a ride.
///
/// ```text
/// NotStarted ──► InProgress ──► Completed
/// ```
///
/// Transitions are driver-triggered. `Completed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    /// Published, accepting reservations
    NotStarted,
    /// Driver has departed
    InProgress,
    /// Trip finished (terminal)
    Completed,
}

impl RideStatus {
    /// Storage/wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The only status this one may move to, if any.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::InProgress),
            Self::InProgress => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Whether `self → to` is a legal transition.
    #[must_use]
    pub fn can_transition_to(&self, to: Self) -> bool {
        self.next() == Some(to)
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown ride status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ride status: {0}")]
pub struct UnknownRideStatus(pub String);

impl FromStr for RideStatus {
    type Err = UnknownRideStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownRideStatus(other.to_string())),
        }
    }
}

/// Monetary amount in cents (BRL).
///
/// Serialized as a decimal string with two places, e.g. `"12.50"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    /// Create a price from cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Amount in cents
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Local departure date and time of a ride.
///
/// Both values are wall-clock values in the service time zone; use
/// [`Schedule::departure_in`] to resolve the instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schedule {
    /// Departure date (local)
    pub date: NaiveDate,
    /// Departure time (local)
    pub time: NaiveTime,
}

impl Schedule {
    /// Creates a new `Schedule`
    #[must_use]
    pub const fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    /// Resolve the departure instant in the given time zone.
    ///
    /// Returns `None` when the local time does not exist (DST gap). An
    /// ambiguous local time resolves to the earlier instant.
    #[must_use]
    pub fn departure_in(&self, tz: Tz) -> Option<DateTime<Utc>> {
        tz.from_local_datetime(&self.date.and_time(self.time))
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A driver-published trip offer with fixed seats, price and schedule.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ride {
    /// Ride ID
    pub id: RideId,
    /// Driver (owner) of the ride
    pub driver_id: UserId,
    /// Vehicle used for the ride
    pub vehicle_id: VehicleId,
    /// Where the ride departs from
    pub origin: String,
    /// Where the ride goes
    pub destination: String,
    /// Local departure date/time
    #[serde(flatten)]
    pub schedule: Schedule,
    /// Total passenger seats offered
    pub seat_count: u32,
    /// Passengers in reservation order (unique)
    pub passenger_ids: Vec<UserId>,
    /// Lifecycle status
    pub status: RideStatus,
    /// Route distance in kilometers
    pub distance_km: f64,
    /// Price per seat
    pub price: Price,
    /// When the ride was published
    pub created_at: DateTime<Utc>,
    /// When the ride last changed
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    /// Number of seats already reserved.
    #[must_use]
    pub fn seats_taken(&self) -> u32 {
        u32::try_from(self.passenger_ids.len()).unwrap_or(u32::MAX)
    }

    /// Number of seats still free.
    #[must_use]
    pub fn seats_available(&self) -> u32 {
        self.seat_count.saturating_sub(self.seats_taken())
    }

    /// Whether every seat is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.seats_available() == 0
    }

    /// Whether `user` holds a seat.
    #[must_use]
    pub fn has_passenger(&self, user: UserId) -> bool {
        self.passenger_ids.contains(&user)
    }

    /// Whether `user` drives this ride.
    #[must_use]
    pub fn is_driven_by(&self, user: UserId) -> bool {
        self.driver_id == user
    }
}

/// A vehicle registered by a driver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Vehicle {
    /// Vehicle ID
    pub id: VehicleId,
    /// Owning user
    pub owner_id: UserId,
    /// Manufacturer
    pub brand: String,
    /// Model name
    pub model: String,
    /// Model year
    pub year: i32,
    /// Color
    pub color: String,
    /// Normalized license plate (unique)
    pub plate: String,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

/// A registered user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Read Model
// ============================================================================

/// Driver fields joined into ride listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DriverSummary {
    /// Driver ID
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Contact phone
    pub phone: String,
}

impl From<&User> for DriverSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// Vehicle fields joined into ride listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VehicleSummary {
    /// Vehicle ID
    pub id: VehicleId,
    /// Manufacturer
    pub brand: String,
    /// Model name
    pub model: String,
    /// Model year
    pub year: i32,
    /// Color
    pub color: String,
    /// License plate
    pub plate: String,
}

impl From<&Vehicle> for VehicleSummary {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id,
            brand: vehicle.brand.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            color: vehicle.color.clone(),
            plate: vehicle.plate.clone(),
        }
    }
}

/// A ride with its driver and vehicle details joined in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RideDetails {
    /// The ride itself
    #[serde(flatten)]
    pub ride: Ride,
    /// Driver details
    pub driver: DriverSummary,
    /// Vehicle details
    pub vehicle: VehicleSummary,
}

/// Ride search filters. Empty filters match every open ride.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RideQuery {
    /// Case-insensitive substring of the origin
    pub origin: Option<String>,
    /// Case-insensitive substring of the destination
    pub destination: Option<String>,
    /// Only rides departing on or after this date
    pub date: Option<NaiveDate>,
}

impl RideQuery {
    /// Whether `ride` satisfies the filters.
    ///
    /// Completed rides never match.
    #[must_use]
    pub fn matches(&self, ride: &Ride) -> bool {
        if ride.status.is_terminal() {
            return false;
        }
        let contains = |haystack: &str, needle: &Option<String>| {
            needle.as_deref().is_none_or(|needle| {
                haystack.to_lowercase().contains(&needle.trim().to_lowercase())
            })
        };
        contains(&ride.origin, &self.origin)
            && contains(&ride.destination, &self.destination)
            && self.date.is_none_or(|date| ride.schedule.date >= date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(RideStatus::NotStarted.can_transition_to(RideStatus::InProgress));
        assert!(RideStatus::InProgress.can_transition_to(RideStatus::Completed));
        assert!(!RideStatus::NotStarted.can_transition_to(RideStatus::Completed));
        assert!(!RideStatus::Completed.can_transition_to(RideStatus::NotStarted));
        assert!(RideStatus::Completed.is_terminal());
    }

    #[test]
    fn test_status_round_trips_through_storage_string() {
        for status in [RideStatus::NotStarted, RideStatus::InProgress, RideStatus::Completed] {
            assert_eq!(status.as_str().parse::<RideStatus>(), Ok(status));
        }
        assert!("cancelled".parse::<RideStatus>().is_err());
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_cents(1250).to_string(), "12.50");
        assert_eq!(Price::from_cents(7).to_string(), "0.07");
        assert_eq!(Price::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_departure_resolves_in_service_timezone() {
        let schedule = Schedule::new(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap_or_default(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
        );
        let departure = schedule.departure_in(chrono_tz::America::Sao_Paulo);
        // São Paulo is UTC-3 (no DST since 2019).
        assert_eq!(
            departure.map(|d| d.to_rfc3339()),
            Some("2025-03-10T11:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_ride_json_shape() {
        let ride = Ride {
            id: RideId::new(),
            driver_id: UserId::new(),
            vehicle_id: VehicleId::new(),
            origin: "Campinas".to_string(),
            destination: "Santos".to_string(),
            schedule: Schedule::new(
                NaiveDate::from_ymd_opt(2025, 6, 12).unwrap_or_default(),
                NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            ),
            seat_count: 3,
            passenger_ids: Vec::new(),
            status: RideStatus::NotStarted,
            distance_km: 100.0,
            price: Price::from_cents(1667),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&ride).unwrap_or_default();

        assert_eq!(json["date"], "2025-06-12");
        assert_eq!(json["time"], "08:00:00");
        assert_eq!(json["price"], "16.67");
        assert_eq!(json["status"], "not_started");
        assert_eq!(json["seat_count"], 3);
        assert!(json.get("schedule").is_none());
    }
}
