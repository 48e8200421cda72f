use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::vehicle::VehicleClass;

/// Earnings are not part of the record; see `engine::analytics::driver_earnings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub vehicle: VehicleClass,
    pub available: bool,
    pub experience_years: Option<u32>,
    pub vehicle_capacity_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
}
