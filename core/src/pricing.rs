//! Seat pricing.
//!
//! `price_per_seat = distance_km * rate / seat_count`, rounded to the cent.

use crate::types::Price;

/// Distance and per-seat price for a route.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteQuote {
    /// Route distance, rounded to 0.1 km
    pub distance_km: f64,
    /// Price each passenger pays
    pub price: Price,
}

/// Fixed per-kilometer pricing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PricingPolicy {
    rate_cents_per_km: u32,
}

impl PricingPolicy {
    /// Default rate: R$0.50 per kilometer.
    pub const DEFAULT_RATE_CENTS_PER_KM: u32 = 50;

    /// Creates a policy charging `rate_cents_per_km` for the whole route.
    #[must_use]
    pub const fn new(rate_cents_per_km: u32) -> Self {
        Self { rate_cents_per_km }
    }

    /// Configured rate in cents per kilometer.
    #[must_use]
    pub const fn rate_cents_per_km(&self) -> u32 {
        self.rate_cents_per_km
    }

    /// Quote a route split across `seat_count` passengers.
    ///
    /// A zero seat count is treated as one seat; validation rejects it
    /// before pricing is reached.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Prices are far below i64::MAX cents
    pub fn quote(&self, distance_km: f64, seat_count: u32) -> RouteQuote {
        let distance_km = (distance_km.max(0.0) * 10.0).round() / 10.0;
        let seats = f64::from(seat_count.max(1));
        let cents = (distance_km * f64::from(self.rate_cents_per_km) / seats).round();

        RouteQuote {
            distance_km,
            price: Price::from_cents(cents as i64),
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RATE_CENTS_PER_KM)
    }
}
