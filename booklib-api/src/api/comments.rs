//! Comment API handlers
//!
//! Comments are nested under their book. Update and delete are scoped to
//! the authoring user; the caller-supplied user id stands in for the
//! authenticated identity the fronting deployment provides.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{books, comments};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct EditCommentRequest {
    pub user_id: Uuid,
    pub content: String,
}

/// GET /books/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let rows = comments::comments_for_book(&state.db, book_id).await?;
    Ok(Json(
        rows.into_iter()
            .map(|c| CommentResponse {
                id: c.guid,
                user_id: c.user_id,
                content: c.content,
            })
            .collect(),
    ))
}

/// POST /books/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
    Json(request): Json<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    if request.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content is required".to_string()));
    }

    books::load_book(&state.db, book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book {}", book_id)))?;

    let comment = comments::Comment::new(book_id, request.user_id, request.content);
    comments::insert_comment(&state.db, &comment).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            id: comment.guid,
            user_id: comment.user_id,
            content: comment.content,
        }),
    ))
}

/// PUT /books/:id/comments/:comment_id
pub async fn update_comment(
    State(state): State<AppState>,
    Path((book_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<EditCommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    if request.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content is required".to_string()));
    }

    let comment = comments::find_for_update(&state.db, comment_id, book_id, request.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("comment {}", comment_id)))?;

    comments::update_content(&state.db, comment.guid, &request.content).await?;

    Ok(Json(CommentResponse {
        id: comment.guid,
        user_id: comment.user_id,
        content: request.content,
    }))
}

/// DELETE /books/:id/comments/:comment_id
pub async fn delete_comment(
    State(state): State<AppState>,
    Path((book_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UserScope>,
) -> ApiResult<Json<super::StatusResponse>> {
    let comment = comments::find_for_update(&state.db, comment_id, book_id, request.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("comment {}", comment_id)))?;

    comments::delete_comment(&state.db, comment.guid).await?;

    Ok(Json(super::StatusResponse { status: "deleted" }))
}

/// Caller identity for scoped mutations
#[derive(Debug, Deserialize)]
pub struct UserScope {
    pub user_id: Uuid,
}

/// Build comment routes
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/books/:id/comments",
            get(list_comments).post(add_comment),
        )
        .route(
            "/books/:id/comments/:comment_id",
            axum::routing::put(update_comment).delete(delete_comment),
        )
}
