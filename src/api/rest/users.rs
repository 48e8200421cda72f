use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/users", post(register_user).get(list_users))
}

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
}

/// Registering a taken username returns the existing account unchanged.
async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<User>, AppError> {
    let username = payload.username.trim();
    let email = payload.email.trim();

    if username.is_empty() {
        return Err(AppError::BadRequest("username cannot be empty".to_string()));
    }

    if !email.contains('@') {
        return Err(AppError::BadRequest(format!("invalid email {email:?}")));
    }

    let (user, created) = state.store.insert_user_if_absent(User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        created_at: Utc::now(),
    });

    if created {
        info!(user_id = %user.id, username = %user.username, "user registered");
    }

    Ok(Json(user))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<User>> {
    Json(state.store.users())
}
