use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::config::TrackingConfig;
use crate::error::AppError;
use crate::models::booking::BookingStatus;
use crate::models::tracking::TrackingSample;
use crate::state::AppState;

/// Mock position: the anchor point jittered uniformly on both axes.
pub fn mock_position<R: Rng + ?Sized>(config: &TrackingConfig, rng: &mut R) -> (f64, f64) {
    let jitter = config.jitter.abs();
    if !jitter.is_finite() || jitter == 0.0 {
        return (config.anchor_lat, config.anchor_lng);
    }

    (
        config.anchor_lat + rng.gen_range(-jitter..=jitter),
        config.anchor_lng + rng.gen_range(-jitter..=jitter),
    )
}

/// Returns the booking's tracking sample, generating and storing it on the
/// first request. Bookings still waiting for a driver have nothing to track.
pub fn track(state: &AppState, booking_id: Uuid) -> Result<TrackingSample, AppError> {
    let booking = state
        .store
        .booking(booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

    if booking.status == BookingStatus::Booked {
        return Err(AppError::Conflict(format!(
            "booking {booking_id} has no driver yet"
        )));
    }

    let sample = state.store.tracking_or_insert_with(booking_id, || {
        let (latitude, longitude) = mock_position(&state.config.tracking, &mut rand::thread_rng());
        TrackingSample {
            id: Uuid::new_v4(),
            booking_id,
            latitude,
            longitude,
            recorded_at: Utc::now(),
        }
    });

    Ok(sample)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    use super::{mock_position, track};
    use crate::config::TrackingConfig;
    use crate::error::AppError;
    use crate::models::booking::{Booking, BookingStatus};
    use crate::models::vehicle::VehicleClass;
    use crate::state::AppState;

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            user: "user1".to_string(),
            driver: (status != BookingStatus::Booked).then(Uuid::new_v4),
            pickup: "40.7128,-74.0060".parse().unwrap(),
            dropoff: "40.730610,-73.935242".parse().unwrap(),
            vehicle_type: VehicleClass::Car,
            estimated_cost: 12.5,
            status,
            booking_date: None,
            goods: None,
            promo_code: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn mock_position_stays_within_jitter_of_anchor() {
        let config = TrackingConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let (lat, lng) = mock_position(&config, &mut rng);
            assert!((lat - config.anchor_lat).abs() <= config.jitter);
            assert!((lng - config.anchor_lng).abs() <= config.jitter);
        }
    }

    #[test]
    fn non_finite_jitter_falls_back_to_anchor() {
        let config = TrackingConfig {
            jitter: f64::NAN,
            ..TrackingConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            mock_position(&config, &mut rng),
            (config.anchor_lat, config.anchor_lng)
        );
    }

    #[test]
    fn sample_is_generated_once_and_reused() {
        let (state, _rx) = AppState::with_defaults();
        let accepted = booking(BookingStatus::Accepted);
        state.store.insert_booking(accepted.clone());

        let first = track(&state, accepted.id).unwrap();
        let second = track(&state, accepted.id).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.latitude, second.latitude);
        assert_eq!(first.longitude, second.longitude);
    }

    #[test]
    fn unassigned_or_unknown_bookings_are_not_tracked() {
        let (state, _rx) = AppState::with_defaults();
        let open = booking(BookingStatus::Booked);
        state.store.insert_booking(open.clone());

        assert!(matches!(track(&state, open.id), Err(AppError::Conflict(_))));
        assert!(matches!(track(&state, Uuid::new_v4()), Err(AppError::NotFound(_))));
    }
}
