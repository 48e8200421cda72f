use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::BookingStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingEventKind {
    Created,
    Accepted,
    StatusChanged,
    Cancelled,
}

/// Published on every lifecycle transition; streamed to websocket clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub kind: BookingEventKind,
    pub status: BookingStatus,
    pub driver: Option<Uuid>,
    pub at: DateTime<Utc>,
}
