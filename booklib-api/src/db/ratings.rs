//! Rating database operations
//!
//! One rating per (book, user); the unique constraint enforces it under
//! concurrent requests.

use booklib_common::Result;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Rating record
#[derive(Debug, Clone)]
pub struct Rating {
    pub guid: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub rating: i64,
}

impl Rating {
    pub fn new(book_id: Uuid, user_id: Uuid, rating: i64) -> Self {
        Self {
            guid: Uuid::new_v4(),
            book_id,
            user_id,
            rating,
        }
    }
}

fn map_rating_row(row: &SqliteRow) -> Result<Rating> {
    let guid_str: String = row.get("guid");
    let book_str: String = row.get("book_id");
    let user_str: String = row.get("user_id");
    Ok(Rating {
        guid: super::parse_guid(&guid_str)?,
        book_id: super::parse_guid(&book_str)?,
        user_id: super::parse_guid(&user_str)?,
        rating: row.get("rating"),
    })
}

/// Insert a new rating
pub async fn insert_rating(pool: &SqlitePool, rating: &Rating) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ratings (guid, book_id, user_id, rating, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(rating.guid.to_string())
    .bind(rating.book_id.to_string())
    .bind(rating.user_id.to_string())
    .bind(rating.rating)
    .execute(pool)
    .await?;

    Ok(())
}

/// List ratings for a book
pub async fn ratings_for_book(pool: &SqlitePool, book_id: Uuid) -> Result<Vec<Rating>> {
    let rows = sqlx::query(
        "SELECT guid, book_id, user_id, rating FROM ratings WHERE book_id = ?",
    )
    .bind(book_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_rating_row).collect()
}

/// Average rating for a book, None when unrated
pub async fn average_for_book(pool: &SqlitePool, book_id: Uuid) -> Result<Option<f64>> {
    let row = sqlx::query("SELECT AVG(rating) AS average FROM ratings WHERE book_id = ?")
        .bind(book_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(row.get("average"))
}

/// Load a user's rating for a book, if any
pub async fn find_by_book_and_user(
    pool: &SqlitePool,
    book_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Rating>> {
    let row = sqlx::query(
        "SELECT guid, book_id, user_id, rating FROM ratings WHERE book_id = ? AND user_id = ?",
    )
    .bind(book_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_rating_row).transpose()
}

/// Load one rating scoped to a book and its authoring user
pub async fn find_for_update(
    pool: &SqlitePool,
    rating_id: Uuid,
    book_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Rating>> {
    let row = sqlx::query(
        r#"
        SELECT guid, book_id, user_id, rating
        FROM ratings
        WHERE guid = ? AND book_id = ? AND user_id = ?
        "#,
    )
    .bind(rating_id.to_string())
    .bind(book_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_rating_row).transpose()
}

/// Update a rating's value
pub async fn update_value(pool: &SqlitePool, rating_id: Uuid, value: i64) -> Result<()> {
    sqlx::query("UPDATE ratings SET rating = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
        .bind(value)
        .bind(rating_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a rating
pub async fn delete_rating(pool: &SqlitePool, rating_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM ratings WHERE guid = ?")
        .bind(rating_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
