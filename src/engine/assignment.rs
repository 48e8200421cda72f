use std::sync::Arc;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::lifecycle;
use crate::error::AppError;
use crate::models::booking::BookingStatus;
use crate::models::driver::Driver;
use crate::models::vehicle::VehicleClass;
use crate::state::AppState;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOutcome {
    Assigned(Uuid),
    NoDriver,
    /// The booking was cancelled or taken by hand before the worker got to it.
    Skipped,
}

impl AssignmentOutcome {
    fn label(&self) -> &'static str {
        match self {
            AssignmentOutcome::Assigned(_) => "success",
            AssignmentOutcome::NoDriver => "no_driver",
            AssignmentOutcome::Skipped => "skipped",
        }
    }
}

/// Drivers currently marked available whose vehicle matches `vehicle`.
pub fn list_available(store: &Store, vehicle: &VehicleClass) -> Vec<Driver> {
    store
        .drivers()
        .into_iter()
        .filter(|driver| driver.available && &driver.vehicle == vehicle)
        .collect()
}

pub fn pick_driver<'a, R: Rng + ?Sized>(candidates: &'a [Driver], rng: &mut R) -> Option<&'a Driver> {
    candidates.choose(rng)
}

pub async fn run_assignment_engine(state: Arc<AppState>, mut booking_rx: mpsc::Receiver<Uuid>) {
    info!("assignment engine started");

    while let Some(booking_id) = booking_rx.recv().await {
        state.metrics.bookings_in_queue.dec();

        let start = Instant::now();
        let outcome = match auto_assign(&state, booking_id).await {
            Ok(outcome) => outcome.label(),
            Err(err) => {
                error!(booking_id = %booking_id, error = %err, "automatic assignment failed");
                "error"
            }
        };

        state
            .metrics
            .assignment_latency_seconds
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());
        state
            .metrics
            .assignments_total
            .with_label_values(&[outcome])
            .inc();
    }

    warn!("assignment engine stopped: queue channel closed");
}

/// Assigns a uniformly random matching driver to a still-open booking.
///
/// A booking with no matching driver stays `booked` for drivers to pick up
/// by hand.
pub async fn auto_assign(state: &AppState, booking_id: Uuid) -> Result<AssignmentOutcome, AppError> {
    let Some(booking) = state.store.booking(booking_id) else {
        return Ok(AssignmentOutcome::Skipped);
    };

    if booking.status != BookingStatus::Booked || booking.driver.is_some() {
        return Ok(AssignmentOutcome::Skipped);
    }

    let candidates = list_available(&state.store, &booking.vehicle_type);
    let chosen = {
        let mut rng = rand::thread_rng();
        pick_driver(&candidates, &mut rng).map(|driver| driver.id)
    };

    let Some(driver_id) = chosen else {
        warn!(
            booking_id = %booking_id,
            vehicle = %booking.vehicle_type,
            "no available driver; booking left open"
        );
        return Ok(AssignmentOutcome::NoDriver);
    };

    match lifecycle::assign(state, booking_id, driver_id).await {
        Ok(_) => Ok(AssignmentOutcome::Assigned(driver_id)),
        // Lost a race with a manual accept or a cancellation.
        Err(AppError::Conflict(_)) | Err(AppError::NotFound(_)) => Ok(AssignmentOutcome::Skipped),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    use super::{auto_assign, list_available, pick_driver, AssignmentOutcome};
    use crate::engine::lifecycle::{self, NewBooking};
    use crate::models::booking::BookingStatus;
    use crate::models::driver::Driver;
    use crate::models::vehicle::VehicleClass;
    use crate::state::AppState;

    fn driver(vehicle: VehicleClass, available: bool) -> Driver {
        Driver {
            id: Uuid::new_v4(),
            name: "test-driver".to_string(),
            vehicle,
            available,
            experience_years: Some(2),
            vehicle_capacity_kg: None,
            created_at: Utc::now(),
        }
    }

    fn booking_request(vehicle: VehicleClass) -> NewBooking {
        NewBooking {
            user: "user1".to_string(),
            pickup: "40.7128,-74.0060".parse().unwrap(),
            dropoff: "40.730610,-73.935242".parse().unwrap(),
            vehicle_type: vehicle,
            booking_date: None,
            goods: None,
            promo_code: None,
        }
    }

    #[test]
    fn only_available_drivers_of_the_class_are_listed() {
        let (state, _rx) = AppState::with_defaults();
        let van = driver(VehicleClass::Van, true);
        state.store.insert_driver(van.clone());
        state.store.insert_driver(driver(VehicleClass::Van, false));
        state.store.insert_driver(driver(VehicleClass::Car, true));

        let listed = list_available(&state.store, &VehicleClass::Van);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, van.id);
    }

    #[test]
    fn pick_driver_draws_from_every_candidate() {
        let candidates = vec![
            driver(VehicleClass::Car, true),
            driver(VehicleClass::Car, true),
            driver(VehicleClass::Car, true),
        ];
        let mut rng = StdRng::seed_from_u64(7);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(pick_driver(&candidates, &mut rng).unwrap().id);
        }
        assert_eq!(seen.len(), candidates.len());
        assert!(pick_driver(&[], &mut rng).is_none());
    }

    #[tokio::test]
    async fn auto_assign_takes_a_matching_driver() {
        let (state, _rx) = AppState::with_defaults();
        let truck = driver(VehicleClass::Truck, true);
        state.store.insert_driver(truck.clone());
        state.store.insert_driver(driver(VehicleClass::Car, true));

        let booking = lifecycle::create(&state, booking_request(VehicleClass::Truck))
            .await
            .unwrap()
            .booking;

        let outcome = auto_assign(&state, booking.id).await.unwrap();
        assert_eq!(outcome, AssignmentOutcome::Assigned(truck.id));

        let stored = state.store.booking(booking.id).unwrap();
        assert_eq!(stored.status, BookingStatus::Accepted);
        assert_eq!(stored.driver, Some(truck.id));
    }

    #[tokio::test]
    async fn auto_assign_leaves_booking_open_without_drivers() {
        let (state, _rx) = AppState::with_defaults();
        let booking = lifecycle::create(&state, booking_request(VehicleClass::Van))
            .await
            .unwrap()
            .booking;

        assert_eq!(auto_assign(&state, booking.id).await.unwrap(), AssignmentOutcome::NoDriver);
        assert_eq!(state.store.booking(booking.id).unwrap().status, BookingStatus::Booked);
        assert_eq!(auto_assign(&state, Uuid::new_v4()).await.unwrap(), AssignmentOutcome::Skipped);
    }
}
