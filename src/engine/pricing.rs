use serde::Serialize;

use crate::config::PricingConfig;
use crate::error::AppError;
use crate::geo::{haversine_km, GeoPoint};
use crate::models::vehicle::VehicleClass;

/// Booked-but-unassigned trips against drivers ready to take them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Demand {
    pub open_bookings: usize,
    pub available_drivers: usize,
}

impl Demand {
    pub fn is_surging(&self) -> bool {
        self.open_bookings >= self.available_drivers
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub distance_km: f64,
    pub base_fee: f64,
    pub multiplier: f64,
    pub surge_applied: bool,
    pub discount_percent: f64,
    pub estimated_cost: f64,
}

/// `base_fee + distance_km * multiplier`, with the base fee inflated while
/// demand meets or exceeds supply (when surge pricing is on).
pub fn estimate(
    config: &PricingConfig,
    pickup: &GeoPoint,
    dropoff: &GeoPoint,
    vehicle: &VehicleClass,
    demand: Demand,
) -> Quote {
    let distance_km = haversine_km(pickup, dropoff);
    let multiplier = vehicle.rate_multiplier();
    let surge_applied = config.surge_enabled && demand.is_surging();

    let base_fee = if surge_applied {
        config.base_fee * config.surge_factor
    } else {
        config.base_fee
    };

    Quote {
        distance_km,
        base_fee,
        multiplier,
        surge_applied,
        discount_percent: 0.0,
        estimated_cost: (base_fee + distance_km * multiplier).max(0.0),
    }
}

/// Applies a promotion code from the configured table to a quote.
pub fn apply_promo(config: &PricingConfig, quote: Quote, code: &str) -> Result<Quote, AppError> {
    let percent = config
        .promo_codes
        .get(&code.trim().to_ascii_uppercase())
        .copied()
        .ok_or_else(|| AppError::BadRequest(format!("unknown promo code {code}")))?;

    Ok(Quote {
        discount_percent: percent,
        estimated_cost: quote.estimated_cost * (1.0 - percent / 100.0),
        ..quote
    })
}
