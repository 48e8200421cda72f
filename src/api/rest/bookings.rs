use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::lifecycle::{self, NewBooking, Transition};
use crate::engine::pricing::Quote;
use crate::engine::reviews::{average_rating_for_booking, submit_review};
use crate::engine::tracking::track;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::booking::{Booking, BookingStatus, GoodsInfo};
use crate::models::review::Review;
use crate::models::tracking::TrackingSample;
use crate::models::vehicle::VehicleClass;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quotes", post(create_quote))
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/:id", get(get_booking).delete(cancel_booking))
        .route("/bookings/:id/accept", post(accept_booking))
        .route("/bookings/:id/status", patch(update_booking_status))
        .route("/bookings/:id/tracking", get(get_tracking))
        .route("/bookings/:id/reviews", post(create_review).get(list_reviews))
        .route("/bookings/:id/rating", get(get_rating))
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub pickup: String,
    pub dropoff: String,
    pub vehicle_type: VehicleClass,
    pub promo_code: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub user: String,
    pub pickup: String,
    pub dropoff: String,
    pub vehicle_type: VehicleClass,
    pub booking_date: Option<DateTime<Utc>>,
    pub goods: Option<GoodsInfo>,
    pub promo_code: Option<String>,
}

#[derive(Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<String>,
    pub user: Option<String>,
}

#[derive(Deserialize)]
pub struct AcceptRequest {
    pub driver_id: Uuid,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub rating: u8,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Serialize)]
pub struct RatingResponse {
    pub booking_id: Uuid,
    pub reviews: usize,
    pub average_rating: Option<f64>,
}

async fn create_quote(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QuoteRequest>,
) -> Result<Json<Quote>, AppError> {
    let pickup: GeoPoint = payload.pickup.parse()?;
    let dropoff: GeoPoint = payload.dropoff.parse()?;

    let quote = lifecycle::quote(
        &state,
        &pickup,
        &dropoff,
        &payload.vehicle_type,
        payload.promo_code.as_deref(),
    )?;
    Ok(Json(quote))
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Transition>, AppError> {
    let request = NewBooking {
        user: payload.user,
        pickup: payload.pickup.parse()?,
        dropoff: payload.dropoff.parse()?,
        vehicle_type: payload.vehicle_type,
        booking_date: payload.booking_date,
        goods: payload.goods,
        promo_code: payload.promo_code,
    };

    Ok(Json(lifecycle::create(&state, request).await?))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<BookingStatus>)
        .transpose()
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    let bookings = state
        .store
        .bookings()
        .into_iter()
        .filter(|booking| status.is_none_or(|status| booking.status == status))
        .filter(|booking| {
            query
                .user
                .as_deref()
                .is_none_or(|user| booking.user.eq_ignore_ascii_case(user))
        })
        .collect();

    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .store
        .booking(id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

    Ok(Json(booking))
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transition>, AppError> {
    Ok(Json(lifecycle::cancel(&state, id).await?))
}

async fn accept_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AcceptRequest>,
) -> Result<Json<Transition>, AppError> {
    Ok(Json(lifecycle::assign(&state, id, payload.driver_id).await?))
}

async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Transition>, AppError> {
    let status = payload
        .status
        .parse::<BookingStatus>()
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    Ok(Json(lifecycle::advance(&state, id, status).await?))
}

async fn get_tracking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrackingSample>, AppError> {
    Ok(Json(track(&state, id)?))
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Json<Review>, AppError> {
    Ok(Json(submit_review(&state, id, payload.rating, payload.feedback)?))
}

async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Review>> {
    Json(state.store.reviews_for_booking(id))
}

async fn get_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RatingResponse>, AppError> {
    if state.store.booking(id).is_none() {
        return Err(AppError::NotFound(format!("booking {} not found", id)));
    }

    Ok(Json(RatingResponse {
        booking_id: id,
        reviews: state.store.reviews_for_booking(id).len(),
        average_rating: average_rating_for_booking(&state.store, id),
    }))
}
