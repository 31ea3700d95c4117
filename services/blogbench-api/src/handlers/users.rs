//! User registration.

use axum::{extract::State, http::StatusCode, Json};
use blogbench_core::{CoreError, User, UserId};
use blogbench_store::password;
use serde::Deserialize;
use tracing::info;

use crate::handlers::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /user` — registers a new user. The only unauthenticated route.
pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<StatusCode, ApiError> {
    if req.name.is_empty() || req.password.is_empty() {
        return Err(CoreError::validation("name and password must not be empty").into());
    }

    let password_hash = password::hash_password(&req.password)?;
    let user = User::new(
        UserId::from(state.random.next_id()),
        req.name,
        req.email,
        password_hash,
        state.clock.now(),
    );

    state.users.create(&user).await?;

    info!(user_id = %user.user_id, name = %user.name, "user registered");
    Ok(StatusCode::OK)
}
