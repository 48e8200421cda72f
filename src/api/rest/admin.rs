use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::engine::analytics::{fleet_stats, FleetStats};
use crate::models::admin_log::AdminLog;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/stats", get(get_stats))
        .route("/admin/logs", get(list_logs))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<FleetStats> {
    Json(fleet_stats(&state.store))
}

async fn list_logs(State(state): State<Arc<AppState>>) -> Json<Vec<AdminLog>> {
    Json(state.store.admin_logs())
}
