//! User API handlers
//!
//! Registration and lookup only; authentication lives in the fronting
//! deployment.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::users::{self, User};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.guid,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
}

/// POST /users
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();
    if username.is_empty() || email.is_empty() {
        return Err(ApiError::BadRequest(
            "username and email are required".to_string(),
        ));
    }

    if users::username_or_email_exists(&state.db, &username, &email).await? {
        return Err(ApiError::Conflict("user already exists".to_string()));
    }

    let user = User::new(username, email);
    match users::insert_user(&state.db, &user).await {
        Ok(()) => {}
        // The unique constraint is authoritative under concurrent
        // registration; report the race the same way as the pre-check
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::Conflict("user already exists".to_string()));
        }
        Err(other) => return Err(other.into()),
    }

    tracing::info!(username = %user.username, "Registered user");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let rows = users::list_users(&state.db).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = users::load_user(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", id)))?;

    Ok(Json(user.into()))
}

/// DELETE /users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<super::StatusResponse>> {
    let deleted = users::delete_user(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("user {}", id)));
    }

    Ok(Json(super::StatusResponse { status: "deleted" }))
}

/// Build user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register_user))
        .route("/users/:id", get(get_user).delete(delete_user))
}
