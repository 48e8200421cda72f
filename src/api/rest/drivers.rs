use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::analytics::{driver_earnings, DriverEarnings};
use crate::engine::assignment::list_available;
use crate::engine::reviews::average_rating_for_driver;
use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::vehicle::VehicleClass;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id", get(get_driver))
        .route("/drivers/:id/availability", patch(update_driver_availability))
        .route("/drivers/:id/earnings", get(get_driver_earnings))
        .route("/drivers/:id/rating", get(get_driver_rating))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub vehicle: VehicleClass,
    pub experience_years: Option<u32>,
    pub vehicle_capacity_kg: Option<f64>,
}

#[derive(Deserialize)]
pub struct ListDriversQuery {
    pub vehicle: Option<VehicleClass>,
    pub available: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub available: bool,
}

#[derive(Serialize)]
pub struct DriverRatingResponse {
    pub driver_id: Uuid,
    pub average_rating: Option<f64>,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if !payload.vehicle.is_known() {
        return Err(AppError::BadRequest(format!(
            "unsupported vehicle {}, expected car/van/truck",
            payload.vehicle
        )));
    }

    if payload
        .vehicle_capacity_kg
        .is_some_and(|capacity| capacity <= 0.0)
    {
        return Err(AppError::BadRequest(
            "vehicle capacity must be > 0".to_string(),
        ));
    }

    let driver = Driver {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        vehicle: payload.vehicle,
        available: true,
        experience_years: payload.experience_years,
        vehicle_capacity_kg: payload.vehicle_capacity_kg,
        created_at: Utc::now(),
    };

    state.store.insert_driver(driver.clone());
    state
        .store
        .log_admin_action(format!("driver {} added ({})", driver.name, driver.vehicle));
    Ok(Json(driver))
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDriversQuery>,
) -> Json<Vec<Driver>> {
    let drivers = match (&query.vehicle, query.available) {
        (Some(vehicle), Some(true)) => list_available(&state.store, vehicle),
        _ => state
            .store
            .drivers()
            .into_iter()
            .filter(|driver| query.vehicle.as_ref().is_none_or(|v| &driver.vehicle == v))
            .filter(|driver| query.available.is_none_or(|a| driver.available == a))
            .collect(),
    };

    Json(drivers)
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .store
        .driver(id)
        .ok_or_else(|| AppError::NotFound(format!("driver {} not found", id)))?;

    Ok(Json(driver))
}

async fn update_driver_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Driver>, AppError> {
    let driver = state.store.driver_mut(id, |driver| {
        driver.available = payload.available;
        driver.clone()
    })?;

    state.store.log_admin_action(format!(
        "driver {} marked {}",
        driver.name,
        if driver.available { "available" } else { "unavailable" }
    ));
    Ok(Json(driver))
}

async fn get_driver_earnings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverEarnings>, AppError> {
    Ok(Json(driver_earnings(&state.store, id)?))
}

async fn get_driver_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverRatingResponse>, AppError> {
    if state.store.driver(id).is_none() {
        return Err(AppError::NotFound(format!("driver {} not found", id)));
    }

    Ok(Json(DriverRatingResponse {
        driver_id: id,
        average_rating: average_rating_for_driver(&state.store, id),
    }))
}
