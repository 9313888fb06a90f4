//! Tag database operations
//!
//! Tag identity is the display name. A book holds a set of tags; junction
//! rows collapse duplicates and carry no ordering.

use booklib_common::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Tag record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub guid: Uuid,
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Load tag by exact name match
pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT guid, name FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(Tag {
                guid: super::parse_guid(&guid_str)?,
                name: row.get("name"),
            }))
        }
        None => Ok(None),
    }
}

/// Resolve a tag name to an existing row, creating it if absent
pub async fn find_or_create(conn: &mut SqliteConnection, name: &str) -> Result<Tag> {
    if let Some(existing) = find_by_name(conn, name).await? {
        return Ok(existing);
    }

    let tag = Tag::new(name);
    sqlx::query("INSERT INTO tags (guid, name) VALUES (?, ?)")
        .bind(tag.guid.to_string())
        .bind(&tag.name)
        .execute(conn)
        .await?;

    tracing::debug!(name = %tag.name, "Created tag");
    Ok(tag)
}

/// List all tags ordered by name
pub async fn list_tags(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT guid, name FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let guid_str: String = row.get("guid");
            Ok(Tag {
                guid: super::parse_guid(&guid_str)?,
                name: row.get("name"),
            })
        })
        .collect()
}

/// Load tag by guid
pub async fn load_tag(pool: &SqlitePool, guid: Uuid) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT guid, name FROM tags WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(Tag {
                guid: super::parse_guid(&guid_str)?,
                name: row.get("name"),
            }))
        }
        None => Ok(None),
    }
}

/// Rename a tag
///
/// Returns false if no such tag exists.
pub async fn rename_tag(pool: &SqlitePool, guid: Uuid, name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE tags SET name = ? WHERE guid = ?")
        .bind(name)
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a tag and its book links (administrative operation)
///
/// Returns false if no such tag exists.
pub async fn delete_tag(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await?;
    let guid_str = guid.to_string();

    sqlx::query("DELETE FROM book_tags WHERE tag_id = ?")
        .bind(&guid_str)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM tags WHERE guid = ?")
        .bind(&guid_str)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

/// Link a tag to a book; linking twice is a no-op
pub async fn link_book_tag(conn: &mut SqliteConnection, book_id: Uuid, tag_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO book_tags (book_id, tag_id)
        VALUES (?, ?)
        ON CONFLICT (book_id, tag_id) DO NOTHING
        "#,
    )
    .bind(book_id.to_string())
    .bind(tag_id.to_string())
    .execute(conn)
    .await?;

    Ok(())
}

/// Load a book's tags ordered by name
pub async fn tags_for_book(conn: &mut SqliteConnection, book_id: Uuid) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.guid, t.name
        FROM tags t
        JOIN book_tags bt ON bt.tag_id = t.guid
        WHERE bt.book_id = ?
        ORDER BY t.name
        "#,
    )
    .bind(book_id.to_string())
    .fetch_all(conn)
    .await?;

    rows.iter()
        .map(|row| {
            let guid_str: String = row.get("guid");
            Ok(Tag {
                guid: super::parse_guid(&guid_str)?,
                name: row.get("name"),
            })
        })
        .collect()
}
