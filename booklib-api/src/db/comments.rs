//! Comment database operations

use booklib_common::Result;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Comment record
#[derive(Debug, Clone)]
pub struct Comment {
    pub guid: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

impl Comment {
    pub fn new(book_id: Uuid, user_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            book_id,
            user_id,
            content: content.into(),
        }
    }
}

fn map_comment_row(row: &SqliteRow) -> Result<Comment> {
    let guid_str: String = row.get("guid");
    let book_str: String = row.get("book_id");
    let user_str: String = row.get("user_id");
    Ok(Comment {
        guid: super::parse_guid(&guid_str)?,
        book_id: super::parse_guid(&book_str)?,
        user_id: super::parse_guid(&user_str)?,
        content: row.get("content"),
    })
}

/// Insert a new comment
pub async fn insert_comment(pool: &SqlitePool, comment: &Comment) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO comments (guid, book_id, user_id, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(comment.guid.to_string())
    .bind(comment.book_id.to_string())
    .bind(comment.user_id.to_string())
    .bind(&comment.content)
    .execute(pool)
    .await?;

    Ok(())
}

/// List comments for a book, oldest first
pub async fn comments_for_book(pool: &SqlitePool, book_id: Uuid) -> Result<Vec<Comment>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, book_id, user_id, content
        FROM comments
        WHERE book_id = ?
        ORDER BY created_at
        "#,
    )
    .bind(book_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_comment_row).collect()
}

/// Load one comment scoped to a book and its authoring user
///
/// The user scope means callers can only touch their own comments.
pub async fn find_for_update(
    pool: &SqlitePool,
    comment_id: Uuid,
    book_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Comment>> {
    let row = sqlx::query(
        r#"
        SELECT guid, book_id, user_id, content
        FROM comments
        WHERE guid = ? AND book_id = ? AND user_id = ?
        "#,
    )
    .bind(comment_id.to_string())
    .bind(book_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_comment_row).transpose()
}

/// Update a comment's content
pub async fn update_content(pool: &SqlitePool, comment_id: Uuid, content: &str) -> Result<()> {
    sqlx::query(
        "UPDATE comments SET content = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(content)
    .bind(comment_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a comment
pub async fn delete_comment(pool: &SqlitePool, comment_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM comments WHERE guid = ?")
        .bind(comment_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
