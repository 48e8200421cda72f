use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::vehicle::VehicleClass;

/// Booking status, ordered along the only permitted direction of travel.
///
/// Older clients use several names for the transitional stage ("en route",
/// "in transit", "goods collected"); they all map onto [`BookingStatus::InProgress`].
/// Deserialization goes through [`FromStr`], so every input path accepts the
/// same vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum BookingStatus {
    Booked,
    Accepted,
    InProgress,
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0:?}")]
pub struct UnknownStatus(pub String);

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Booked,
        BookingStatus::Accepted,
        BookingStatus::InProgress,
        BookingStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Delivered => "delivered",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == BookingStatus::Delivered
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "booked" => Ok(BookingStatus::Booked),
            "accepted" | "confirmed" => Ok(BookingStatus::Accepted),
            "in_progress" | "in-progress" | "en route" | "in transit" | "goods collected" => {
                Ok(BookingStatus::InProgress)
            }
            "delivered" => Ok(BookingStatus::Delivered),
            _ => Err(UnknownStatus(raw.to_string())),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownStatus;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsInfo {
    pub description: String,
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user: String,
    pub driver: Option<Uuid>,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub vehicle_type: VehicleClass,
    pub estimated_cost: f64,
    pub status: BookingStatus,
    pub booking_date: Option<DateTime<Utc>>,
    pub goods: Option<GoodsInfo>,
    pub promo_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
