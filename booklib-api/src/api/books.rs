//! Book API handlers
//!
//! Creation and recheck run through the catalog service so enrichment
//! and duplicate detection behave identically regardless of transport;
//! the remaining endpoints are plain catalog CRUD.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{BookInput, BookRecord};
use crate::db::{authors, books, comments, ratings, tags};
use crate::error::{ApiError, ApiResult};
use crate::providers::normalize::{year_from_date, OneOrMany};
use crate::AppState;

/// A publish year that arrives either as an integer or as a date string
/// like "1965-06-01"; only the leading year segment is kept
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PublishYearField {
    Year(i64),
    Date(String),
}

impl PublishYearField {
    fn into_year(self) -> Option<i64> {
        match self {
            PublishYearField::Year(year) => Some(year),
            PublishYearField::Date(raw) => year_from_date(&raw),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub publish_year: Option<i64>,
    pub series: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookDetail {
    pub id: Uuid,
    pub title: String,
    pub isbn: Option<String>,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub publish_year: Option<i64>,
    pub series: Option<String>,
    pub cover_url: Option<String>,
    pub tags: Vec<String>,
}

impl From<BookRecord> for BookDetail {
    fn from(record: BookRecord) -> Self {
        Self {
            id: record.book.guid,
            title: record.book.title,
            isbn: record.book.isbn,
            authors: record.authors.into_iter().map(|a| a.name).collect(),
            description: record.book.description,
            publish_year: record.book.publish_year,
            series: record.book.series,
            cover_url: record.book.cover_url,
            tags: record.tags.into_iter().map(|t| t.name).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RatingEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rating: i64,
}

#[derive(Debug, Serialize)]
pub struct CommentEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

/// GET /books/:id/full response: book plus ratings and comments
#[derive(Debug, Serialize)]
pub struct BookFullResponse {
    #[serde(flatten)]
    pub book: BookDetail,
    pub average_rating: Option<f64>,
    pub ratings: Vec<RatingEntry>,
    pub comments: Vec<CommentEntry>,
}

/// POST /books request
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub series: Option<String>,
    pub publish_year: Option<PublishYearField>,
    pub cover_url: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Metadata provider to enrich from; the registry default when unset
    pub provider: Option<String>,
}

/// POST /books response
#[derive(Debug, Serialize)]
pub struct CreateBookResponse {
    pub id: Uuid,
    pub title: String,
    /// Present when enrichment failed non-fatally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_warning: Option<String>,
}

/// PUT /books/:id request (partial update)
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    /// Single name or list; replaces the whole author set
    pub authors: Option<OneOrMany<String>>,
    pub description: Option<String>,
    pub publish_year: Option<PublishYearField>,
    pub series: Option<String>,
    pub cover_url: Option<String>,
}

/// POST /books/:id/recheck request
#[derive(Debug, Default, Deserialize)]
pub struct RecheckRequest {
    pub provider: Option<String>,
}

/// GET /books
pub async fn list_books(State(state): State<AppState>) -> ApiResult<Json<Vec<BookSummary>>> {
    let book_rows = books::list_books(&state.db).await?;

    let mut conn = state.db.acquire().await?;
    let mut summaries = Vec::with_capacity(book_rows.len());
    for book in book_rows {
        let author_names = authors::authors_for_book(&mut conn, book.guid)
            .await?
            .into_iter()
            .map(|a| a.name)
            .collect();
        summaries.push(BookSummary {
            id: book.guid,
            title: book.title,
            authors: author_names,
            description: book.description,
            publish_year: book.publish_year,
            series: book.series,
        });
    }

    Ok(Json(summaries))
}

/// GET /books/:id
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BookDetail>> {
    let record = load_record(&state, id).await?;
    Ok(Json(record.into()))
}

/// GET /books/:id/full
///
/// Book info together with its ratings (and their average) and comments.
pub async fn get_book_full(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BookFullResponse>> {
    let record = load_record(&state, id).await?;

    let average_rating = ratings::average_for_book(&state.db, id).await?;
    let rating_rows = ratings::ratings_for_book(&state.db, id).await?;
    let comment_rows = comments::comments_for_book(&state.db, id).await?;

    Ok(Json(BookFullResponse {
        book: record.into(),
        average_rating,
        ratings: rating_rows
            .into_iter()
            .map(|r| RatingEntry {
                id: r.guid,
                user_id: r.user_id,
                rating: r.rating,
            })
            .collect(),
        comments: comment_rows
            .into_iter()
            .map(|c| CommentEntry {
                id: c.guid,
                user_id: c.user_id,
                content: c.content,
            })
            .collect(),
    }))
}

/// POST /books
///
/// Create a book, enriching from a metadata provider when an ISBN is
/// supplied. Provider failure degrades to creation from caller fields
/// with a warning in the response.
pub async fn create_book(
    State(state): State<AppState>,
    Json(request): Json<CreateBookRequest>,
) -> ApiResult<(StatusCode, Json<CreateBookResponse>)> {
    tracing::info!(title = ?request.title, isbn = ?request.isbn, "Create book");

    let provider = request.provider.clone();
    let input = BookInput {
        title: request.title,
        isbn: request.isbn,
        description: request.description,
        series: request.series,
        publish_year: request.publish_year.and_then(PublishYearField::into_year),
        cover_url: request.cover_url,
        authors: request.authors,
        tags: request.tags,
    };

    let outcome = state
        .catalog
        .create_book(input, provider.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookResponse {
            id: outcome.record.book.guid,
            title: outcome.record.book.title,
            enrichment_warning: outcome.enrichment_warning,
        }),
    ))
}

/// PUT /books/:id
///
/// Partial update of book fields; an authors value replaces the whole
/// author set.
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookRequest>,
) -> ApiResult<Json<BookDetail>> {
    let mut book = books::load_book(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book {}", id)))?;

    if let Some(title) = request.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("title cannot be empty".to_string()));
        }
        book.title = title.trim().to_string();
    }
    if let Some(description) = request.description {
        book.description = Some(description);
    }
    if let Some(series) = request.series {
        book.series = Some(series);
    }
    if let Some(cover_url) = request.cover_url {
        book.cover_url = Some(cover_url);
    }
    if let Some(raw_year) = request.publish_year {
        book.publish_year = raw_year.into_year();
    }

    let author_names: Option<Vec<String>> = request.authors.map(|a| {
        a.into_vec()
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect()
    });
    if let Some(names) = &author_names {
        if names.is_empty() {
            return Err(ApiError::BadRequest("author cannot be empty".to_string()));
        }
    }

    let mut tx = state.db.begin().await?;

    books::update_book(&mut tx, &book).await?;

    if let Some(names) = author_names {
        let mut resolved = Vec::with_capacity(names.len());
        for name in &names {
            resolved.push(authors::find_or_create(&mut tx, name).await?);
        }
        authors::set_book_authors(&mut tx, book.guid, &resolved).await?;
    }

    let record = BookRecord {
        authors: authors::authors_for_book(&mut tx, book.guid).await?,
        tags: tags::tags_for_book(&mut tx, book.guid).await?,
        book,
    };

    tx.commit().await?;

    Ok(Json(record.into()))
}

/// DELETE /books/:id
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<super::StatusResponse>> {
    let deleted = books::delete_book(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("book {}", id)));
    }

    Ok(Json(super::StatusResponse { status: "deleted" }))
}

/// POST /books/:id/recheck
///
/// Re-run enrichment against the book's stored ISBN. Provider failure
/// is fatal here and leaves the book unmodified.
pub async fn recheck_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<RecheckRequest>>,
) -> ApiResult<Json<BookDetail>> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();

    let book = books::load_book(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book {}", id)))?;

    tracing::info!(book = %id, isbn = ?book.isbn, "Recheck book");

    let record = state
        .catalog
        .recheck_book(book, request.provider.as_deref())
        .await?;

    Ok(Json(record.into()))
}

async fn load_record(state: &AppState, id: Uuid) -> ApiResult<BookRecord> {
    let book = books::load_book(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book {}", id)))?;

    let mut conn = state.db.acquire().await?;
    Ok(BookRecord {
        authors: authors::authors_for_book(&mut conn, book.guid).await?,
        tags: tags::tags_for_book(&mut conn, book.guid).await?,
        book,
    })
}

/// Build book routes
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/books/:id/full", get(get_book_full))
        .route("/books/:id/recheck", post(recheck_book))
}
