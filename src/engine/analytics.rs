use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::engine::reviews::platform_average_rating;
use crate::error::AppError;
use crate::models::booking::BookingStatus;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct DriverEarnings {
    pub driver_id: Uuid,
    pub delivered_trips: usize,
    pub earnings: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetStats {
    pub total_bookings: usize,
    pub bookings_by_status: BTreeMap<&'static str, usize>,
    pub completed_trips: usize,
    pub average_trip_cost: Option<f64>,
    pub total_revenue: f64,
    pub drivers: usize,
    pub available_drivers: usize,
    pub average_rating: Option<f64>,
}

/// Sum of estimated costs over the driver's delivered bookings, computed on
/// every call.
pub fn driver_earnings(store: &Store, driver_id: Uuid) -> Result<DriverEarnings, AppError> {
    if store.driver(driver_id).is_none() {
        return Err(AppError::NotFound(format!("driver {driver_id} not found")));
    }

    let delivered: Vec<f64> = store
        .bookings_for_driver(driver_id)
        .into_iter()
        .filter(|booking| booking.status == BookingStatus::Delivered)
        .map(|booking| booking.estimated_cost)
        .collect();

    Ok(DriverEarnings {
        driver_id,
        delivered_trips: delivered.len(),
        earnings: delivered.iter().sum(),
    })
}

pub fn fleet_stats(store: &Store) -> FleetStats {
    let bookings = store.bookings();

    let mut bookings_by_status: BTreeMap<&'static str, usize> = BookingStatus::ALL
        .iter()
        .map(|status| (status.as_str(), 0))
        .collect();
    for booking in &bookings {
        *bookings_by_status.entry(booking.status.as_str()).or_default() += 1;
    }

    let delivered_costs: Vec<f64> = bookings
        .iter()
        .filter(|booking| booking.status == BookingStatus::Delivered)
        .map(|booking| booking.estimated_cost)
        .collect();
    let total_revenue: f64 = delivered_costs.iter().sum();
    let average_trip_cost =
        (!delivered_costs.is_empty()).then(|| total_revenue / delivered_costs.len() as f64);

    FleetStats {
        total_bookings: bookings.len(),
        bookings_by_status,
        completed_trips: delivered_costs.len(),
        average_trip_cost,
        total_revenue,
        drivers: store.driver_count(),
        available_drivers: store.available_driver_count(),
        average_rating: platform_average_rating(store),
    }
}
