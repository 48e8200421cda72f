use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::BookingStatus;
use crate::models::review::{Review, MAX_RATING, MIN_RATING};
use crate::state::AppState;
use crate::store::Store;

/// Records feedback for a booking. Several reviews per booking are allowed.
pub fn submit_review(
    state: &AppState,
    booking_id: Uuid,
    rating: u8,
    feedback: String,
) -> Result<Review, AppError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::BadRequest(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }

    let booking = state
        .store
        .booking(booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

    if state.config.review_requires_delivery && booking.status != BookingStatus::Delivered {
        return Err(AppError::Conflict(format!(
            "booking {booking_id} is {}; reviews open after delivery",
            booking.status
        )));
    }

    let review = Review {
        id: Uuid::new_v4(),
        booking_id,
        rating,
        feedback: feedback.trim().to_string(),
        created_at: Utc::now(),
    };
    state.store.insert_review(review.clone());

    info!(booking_id = %booking_id, rating, "review submitted");
    Ok(review)
}

pub fn average_rating_for_booking(store: &Store, booking_id: Uuid) -> Option<f64> {
    average(store.reviews_for_booking(booking_id).iter().map(|r| r.rating))
}

pub fn average_rating_for_driver(store: &Store, driver_id: Uuid) -> Option<f64> {
    let bookings = store.bookings_for_driver(driver_id);
    let reviews = store.reviews();

    average(
        reviews
            .iter()
            .filter(|review| bookings.iter().any(|booking| booking.id == review.booking_id))
            .map(|review| review.rating),
    )
}

pub fn platform_average_rating(store: &Store) -> Option<f64> {
    average(store.reviews().iter().map(|review| review.rating))
}

fn average(ratings: impl Iterator<Item = u8>) -> Option<f64> {
    let (sum, count) = ratings.fold((0u64, 0u64), |(sum, count), rating| {
        (sum + u64::from(rating), count + 1)
    });

    (count > 0).then(|| sum as f64 / count as f64)
}
