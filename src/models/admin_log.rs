use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLog {
    pub id: Uuid,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}
