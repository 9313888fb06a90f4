//! Tag API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::tags;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub name: String,
}

/// GET /tags
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<TagResponse>>> {
    let rows = tags::list_tags(&state.db).await?;
    Ok(Json(
        rows.into_iter()
            .map(|t| TagResponse {
                id: t.guid,
                name: t.name,
            })
            .collect(),
    ))
}

/// POST /tags
pub async fn create_tag(
    State(state): State<AppState>,
    Json(request): Json<TagRequest>,
) -> ApiResult<(StatusCode, Json<TagResponse>)> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("tag name cannot be empty".to_string()));
    }

    let mut conn = state.db.acquire().await?;
    let tag = tags::find_or_create(&mut conn, &name).await?;

    Ok((
        StatusCode::CREATED,
        Json(TagResponse {
            id: tag.guid,
            name: tag.name,
        }),
    ))
}

/// PUT /tags/:id
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TagRequest>,
) -> ApiResult<Json<TagResponse>> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("tag name cannot be empty".to_string()));
    }

    let renamed = match tags::rename_tag(&state.db, id, &name).await {
        Ok(renamed) => renamed,
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::Conflict(format!("tag {} already exists", name)));
        }
        Err(other) => return Err(other.into()),
    };
    if !renamed {
        return Err(ApiError::NotFound(format!("tag {}", id)));
    }

    Ok(Json(TagResponse { id, name }))
}

/// DELETE /tags/:id
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<super::StatusResponse>> {
    let deleted = tags::delete_tag(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("tag {}", id)));
    }

    Ok(Json(super::StatusResponse { status: "deleted" }))
}

/// Build tag routes
pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/:id", axum::routing::put(update_tag).delete(delete_tag))
}
