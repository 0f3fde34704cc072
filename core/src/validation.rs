//! Input validation for rides, vehicles and users.
//!
//! Raw inputs arrive with every field optional so that a missing field is
//! reported as a validation failure rather than a deserialization error.
//! Each `validate_*` function turns a raw input into a validated value or a
//! [`RideError::Validation`].

use crate::error::{Result, RideError};
use crate::types::{Ride, Schedule, Vehicle, VehicleId};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

/// Rides departing today must leave at least this many minutes from now.
pub const MIN_SAME_DAY_LEAD_MINUTES: i64 = 30;

/// Largest seat count a ride may offer.
pub const MAX_SEATS: u32 = 8;

/// Oldest model year accepted for a vehicle.
pub const MIN_VEHICLE_YEAR: i32 = 1950;

// ============================================================================
// Rides
// ============================================================================

/// Raw input for publishing a ride.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RideDraft {
    /// Departure place
    pub origin: Option<String>,
    /// Arrival place
    pub destination: Option<String>,
    /// Local date, `YYYY-MM-DD`
    pub date: Option<String>,
    /// Local time, `HH:MM` or `HH:MM:SS`
    pub time: Option<String>,
    /// Seats offered
    pub seat_count: Option<i64>,
    /// Vehicle to use; required when the driver owns more than one
    pub vehicle_id: Option<VehicleId>,
}

/// A ride draft that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedRide {
    /// Trimmed origin
    pub origin: String,
    /// Trimmed destination
    pub destination: String,
    /// Parsed local schedule
    pub schedule: Schedule,
    /// Resolved departure instant
    pub departure: DateTime<Utc>,
    /// Seats offered
    pub seat_count: u32,
}

/// Validates a [`RideDraft`] against the clock and service time zone.
///
/// # Errors
///
/// Returns [`RideError::Validation`] when a required field is missing or
/// blank, origin equals destination, the date/time cannot be parsed or is not
/// far enough in the future, or the seat count is out of range.
pub fn validate_new_ride(draft: &RideDraft, now: DateTime<Utc>, tz: Tz) -> Result<ValidatedRide> {
    let mut missing = Vec::new();
    let origin = non_blank(draft.origin.as_deref());
    let destination = non_blank(draft.destination.as_deref());
    let date = non_blank(draft.date.as_deref());
    let time = non_blank(draft.time.as_deref());

    if origin.is_none() {
        missing.push("origin");
    }
    if destination.is_none() {
        missing.push("destination");
    }
    if date.is_none() {
        missing.push("date");
    }
    if time.is_none() {
        missing.push("time");
    }
    if draft.seat_count.is_none() {
        missing.push("seat_count");
    }

    let (Some(origin), Some(destination), Some(date), Some(time), Some(seat_count)) =
        (origin, destination, date, time, draft.seat_count)
    else {
        return Err(RideError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    };

    ensure_distinct_places(origin, destination)?;
    let schedule = Schedule::new(parse_date(date)?, parse_time(time)?);
    let departure = validate_schedule(&schedule, now, tz)?;
    let seat_count = validate_seat_count(seat_count)?;

    Ok(ValidatedRide {
        origin: origin.to_string(),
        destination: destination.to_string(),
        schedule,
        departure,
        seat_count,
    })
}

/// Checks that a departure is in the future, and at least
/// [`MIN_SAME_DAY_LEAD_MINUTES`] ahead when it falls on today's local date.
///
/// Returns the resolved departure instant.
///
/// # Errors
///
/// Returns [`RideError::Validation`] for non-existent local times, past
/// departures and same-day departures that are too soon.
pub fn validate_schedule(schedule: &Schedule, now: DateTime<Utc>, tz: Tz) -> Result<DateTime<Utc>> {
    let departure = schedule
        .departure_in(tz)
        .ok_or_else(|| RideError::Validation("invalid date or time".to_string()))?;

    if departure <= now {
        return Err(RideError::Validation(
            "ride cannot be scheduled in the past".to_string(),
        ));
    }

    let today = now.with_timezone(&tz).date_naive();
    if schedule.date == today && departure < now + Duration::minutes(MIN_SAME_DAY_LEAD_MINUTES) {
        return Err(RideError::Validation(format!(
            "rides departing today must start at least {MIN_SAME_DAY_LEAD_MINUTES} minutes from now"
        )));
    }

    Ok(departure)
}

/// Checks `1 <= seat_count <= MAX_SEATS`.
///
/// # Errors
///
/// Returns [`RideError::Validation`] when out of range.
pub fn validate_seat_count(seat_count: i64) -> Result<u32> {
    if seat_count < 1 {
        return Err(RideError::Validation(
            "seat count must be at least 1".to_string(),
        ));
    }
    u32::try_from(seat_count)
        .ok()
        .filter(|seats| *seats <= MAX_SEATS)
        .ok_or_else(|| RideError::Validation(format!("seat count cannot exceed {MAX_SEATS}")))
}

/// Raw partial edit of a ride. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RideChanges {
    /// New origin
    pub origin: Option<String>,
    /// New destination
    pub destination: Option<String>,
    /// New local date
    pub date: Option<String>,
    /// New local time
    pub time: Option<String>,
    /// New seat count
    pub seat_count: Option<i64>,
    /// New vehicle
    pub vehicle_id: Option<VehicleId>,
}

impl RideChanges {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.origin.is_none()
            && self.destination.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.seat_count.is_none()
            && self.vehicle_id.is_none()
    }
}

/// The full set of values a ride will have after an edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedRevision {
    /// Resulting origin
    pub origin: String,
    /// Resulting destination
    pub destination: String,
    /// Resulting schedule
    pub schedule: Schedule,
    /// Resulting seat count
    pub seat_count: u32,
    /// New vehicle, when one was requested
    pub vehicle_id: Option<VehicleId>,
    /// Whether distance/price must be looked up again
    pub requote: bool,
}

/// Merges `changes` over `ride` and validates the changed fields.
///
/// The schedule is only re-validated when the date or time changes.
///
/// # Errors
///
/// Returns [`RideError::Validation`] for empty edits, blank values, unparseable
/// or past schedules, equal origin/destination and out-of-range seat counts.
pub fn plan_revision(
    ride: &Ride,
    changes: &RideChanges,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<PlannedRevision> {
    if changes.is_empty() {
        return Err(RideError::Validation("no changes supplied".to_string()));
    }

    let origin = changed_text("origin", changes.origin.as_deref())?.unwrap_or(&ride.origin);
    let destination =
        changed_text("destination", changes.destination.as_deref())?.unwrap_or(&ride.destination);
    ensure_distinct_places(origin, destination)?;

    let date = changed_text("date", changes.date.as_deref())?
        .map(parse_date)
        .transpose()?
        .unwrap_or(ride.schedule.date);
    let time = changed_text("time", changes.time.as_deref())?
        .map(parse_time)
        .transpose()?
        .unwrap_or(ride.schedule.time);
    let schedule = Schedule::new(date, time);
    if schedule != ride.schedule {
        validate_schedule(&schedule, now, tz)?;
    }

    let seat_count = changes
        .seat_count
        .map(validate_seat_count)
        .transpose()?
        .unwrap_or(ride.seat_count);

    let requote = origin != ride.origin
        || destination != ride.destination
        || seat_count != ride.seat_count;

    Ok(PlannedRevision {
        origin: origin.to_string(),
        destination: destination.to_string(),
        schedule,
        seat_count,
        vehicle_id: changes.vehicle_id,
        requote,
    })
}

/// Picks the vehicle for a ride from the driver's fleet.
///
/// # Errors
///
/// Returns [`RideError::VehicleSelection`] when the requested vehicle is not
/// in `owned`, the driver has no vehicles, or the driver has several and
/// none was requested.
pub fn select_vehicle(owned: &[Vehicle], requested: Option<VehicleId>) -> Result<&Vehicle> {
    match (requested, owned) {
        (Some(id), _) => owned.iter().find(|vehicle| vehicle.id == id).ok_or_else(|| {
            RideError::VehicleSelection(format!("vehicle {id} is not registered to this driver"))
        }),
        (None, []) => Err(RideError::VehicleSelection(
            "register a vehicle before publishing a ride".to_string(),
        )),
        (None, [only]) => Ok(only),
        (None, many) => Err(RideError::VehicleSelection(format!(
            "driver has {} vehicles; choose one with vehicle_id",
            many.len()
        ))),
    }
}

fn ensure_distinct_places(origin: &str, destination: &str) -> Result<()> {
    if origin.to_lowercase() == destination.to_lowercase() {
        return Err(RideError::Validation(
            "origin and destination must be different".to_string(),
        ));
    }
    Ok(())
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RideError::Validation(format!("invalid date '{value}', expected YYYY-MM-DD")))
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| RideError::Validation(format!("invalid time '{value}', expected HH:MM")))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn changed_text<'a>(field: &str, value: Option<&'a str>) -> Result<Option<&'a str>> {
    match value {
        None => Ok(None),
        Some(raw) => non_blank(Some(raw))
            .map(Some)
            .ok_or_else(|| RideError::Validation(format!("{field} cannot be blank"))),
    }
}

// ============================================================================
// Vehicles
// ============================================================================

/// Raw input for registering a vehicle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewVehicle {
    /// Manufacturer
    pub brand: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// Model year
    pub year: Option<i32>,
    /// Color
    pub color: Option<String>,
    /// License plate, any separators
    pub plate: Option<String>,
}

/// A vehicle registration that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedVehicle {
    /// Manufacturer
    pub brand: String,
    /// Model name
    pub model: String,
    /// Model year
    pub year: i32,
    /// Color
    pub color: String,
    /// Normalized plate
    pub plate: String,
}

/// Validates a vehicle registration.
///
/// # Errors
///
/// Returns [`RideError::Validation`] for missing fields, a model year outside
/// `MIN_VEHICLE_YEAR..=current_year + 1`, or a malformed plate.
pub fn validate_vehicle(input: &NewVehicle, current_year: i32) -> Result<ValidatedVehicle> {
    let brand = non_blank(input.brand.as_deref());
    let model = non_blank(input.model.as_deref());
    let color = non_blank(input.color.as_deref());
    let plate = non_blank(input.plate.as_deref());

    let missing: Vec<&str> = [
        ("brand", brand.is_none()),
        ("model", model.is_none()),
        ("year", input.year.is_none()),
        ("color", color.is_none()),
        ("plate", plate.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    let (Some(brand), Some(model), Some(year), Some(color), Some(plate)) =
        (brand, model, input.year, color, plate)
    else {
        return Err(RideError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    };

    if !(MIN_VEHICLE_YEAR..=current_year + 1).contains(&year) {
        return Err(RideError::Validation(format!(
            "model year must be between {MIN_VEHICLE_YEAR} and {}",
            current_year + 1
        )));
    }

    Ok(ValidatedVehicle {
        brand: brand.to_string(),
        model: model.to_string(),
        year,
        color: color.to_string(),
        plate: normalize_plate(plate)?,
    })
}

/// Normalizes a Brazilian plate to seven upper-case characters.
///
/// Accepts the legacy `ABC1234` and Mercosul `ABC1D23` layouts, with or
/// without a hyphen or spaces.
///
/// # Errors
///
/// Returns [`RideError::Validation`] when the plate matches neither layout.
pub fn normalize_plate(raw: &str) -> Result<String> {
    let plate: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let bytes = plate.as_bytes();

    let valid = bytes.len() == 7
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && bytes[3].is_ascii_digit()
        && (bytes[4].is_ascii_digit() || bytes[4].is_ascii_uppercase())
        && bytes[5..].iter().all(u8::is_ascii_digit);

    if valid {
        Ok(plate)
    } else {
        Err(RideError::Validation(format!("invalid license plate '{raw}'")))
    }
}

// ============================================================================
// Users
// ============================================================================

/// Raw input for registering a user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewUser {
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
}

/// A user registration that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedUser {
    /// Display name
    pub name: String,
    /// Lower-cased email
    pub email: String,
    /// Phone as entered (trimmed)
    pub phone: String,
}

/// Validates a user registration.
///
/// # Errors
///
/// Returns [`RideError::Validation`] for missing fields, a malformed email or
/// a phone with fewer than 10 digits.
pub fn validate_user(input: &NewUser) -> Result<ValidatedUser> {
    let (Some(name), Some(email), Some(phone)) = (
        non_blank(input.name.as_deref()),
        non_blank(input.email.as_deref()),
        non_blank(input.phone.as_deref()),
    ) else {
        return Err(RideError::Validation(
            "name, email and phone are required".to_string(),
        ));
    };

    let email = email.to_lowercase();
    if !is_valid_email(&email) {
        return Err(RideError::Validation(format!("invalid email '{email}'")));
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(10..=13).contains(&digits) {
        return Err(RideError::Validation(format!("invalid phone '{phone}'")));
    }

    Ok(ValidatedUser {
        name: name.to_string(),
        email,
        phone: phone.to_string(),
    })
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
