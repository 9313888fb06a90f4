//! Rating API handlers
//!
//! One rating per user per book; a second attempt by the same user is a
//! conflict, matching the storage-level unique constraint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{books, ratings};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AverageResponse {
    pub id: Uuid,
    pub average: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddRatingRequest {
    pub user_id: Uuid,
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct EditRatingRequest {
    pub user_id: Uuid,
    pub rating: i64,
}

/// GET /books/:id/ratings
///
/// Average rating for a book; null when unrated.
pub async fn get_average(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<AverageResponse>> {
    let average = ratings::average_for_book(&state.db, book_id).await?;
    Ok(Json(AverageResponse {
        id: book_id,
        average,
    }))
}

/// POST /books/:id/ratings
pub async fn add_rating(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
    Json(request): Json<AddRatingRequest>,
) -> ApiResult<(StatusCode, Json<RatingResponse>)> {
    books::load_book(&state.db, book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book {}", book_id)))?;

    if ratings::find_by_book_and_user(&state.db, book_id, request.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "user has already rated this book".to_string(),
        ));
    }

    let rating = ratings::Rating::new(book_id, request.user_id, request.rating);
    match ratings::insert_rating(&state.db, &rating).await {
        Ok(()) => {}
        // Storage constraint settles the race between concurrent ratings
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::Conflict(
                "user has already rated this book".to_string(),
            ));
        }
        Err(other) => return Err(other.into()),
    }

    Ok((
        StatusCode::CREATED,
        Json(RatingResponse {
            id: rating.guid,
            user_id: rating.user_id,
            rating: rating.rating,
        }),
    ))
}

/// PUT /books/:id/ratings/:rating_id
pub async fn update_rating(
    State(state): State<AppState>,
    Path((book_id, rating_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<EditRatingRequest>,
) -> ApiResult<Json<RatingResponse>> {
    let rating = ratings::find_for_update(&state.db, rating_id, book_id, request.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("rating {}", rating_id)))?;

    ratings::update_value(&state.db, rating.guid, request.rating).await?;

    Ok(Json(RatingResponse {
        id: rating.guid,
        user_id: rating.user_id,
        rating: request.rating,
    }))
}

/// DELETE /books/:id/ratings/:rating_id
pub async fn delete_rating(
    State(state): State<AppState>,
    Path((book_id, rating_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<super::comments::UserScope>,
) -> ApiResult<Json<super::StatusResponse>> {
    let rating = ratings::find_for_update(&state.db, rating_id, book_id, request.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("rating {}", rating_id)))?;

    ratings::delete_rating(&state.db, rating.guid).await?;

    Ok(Json(super::StatusResponse { status: "deleted" }))
}

/// Build rating routes
pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/books/:id/ratings", get(get_average).post(add_rating))
        .route(
            "/books/:id/ratings/:rating_id",
            axum::routing::put(update_rating).delete(delete_rating),
        )
}
