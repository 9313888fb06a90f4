//! Author database operations
//!
//! Author identity is the display name: exact-match lookup, unique index,
//! find-or-create on first reference. Authors are never deleted by the
//! reconciliation flow.

use booklib_common::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Author record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub guid: Uuid,
    pub name: String,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Load author by exact name match (case-sensitive, no fuzzy matching)
pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Author>> {
    let row = sqlx::query("SELECT guid, name FROM authors WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(Author {
                guid: super::parse_guid(&guid_str)?,
                name: row.get("name"),
            }))
        }
        None => Ok(None),
    }
}

/// Resolve an author name to an existing row, creating it if absent
pub async fn find_or_create(conn: &mut SqliteConnection, name: &str) -> Result<Author> {
    if let Some(existing) = find_by_name(conn, name).await? {
        return Ok(existing);
    }

    let author = Author::new(name);
    sqlx::query("INSERT INTO authors (guid, name) VALUES (?, ?)")
        .bind(author.guid.to_string())
        .bind(&author.name)
        .execute(conn)
        .await?;

    tracing::debug!(name = %author.name, "Created author");
    Ok(author)
}

/// List all authors ordered by name
pub async fn list_authors(pool: &SqlitePool) -> Result<Vec<Author>> {
    let rows = sqlx::query("SELECT guid, name FROM authors ORDER BY name")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let guid_str: String = row.get("guid");
            Ok(Author {
                guid: super::parse_guid(&guid_str)?,
                name: row.get("name"),
            })
        })
        .collect()
}

/// Load a book's authors in stored order
pub async fn authors_for_book(conn: &mut SqliteConnection, book_id: Uuid) -> Result<Vec<Author>> {
    let rows = sqlx::query(
        r#"
        SELECT a.guid, a.name
        FROM authors a
        JOIN book_authors ba ON ba.author_id = a.guid
        WHERE ba.book_id = ?
        ORDER BY ba.position
        "#,
    )
    .bind(book_id.to_string())
    .fetch_all(conn)
    .await?;

    rows.iter()
        .map(|row| {
            let guid_str: String = row.get("guid");
            Ok(Author {
                guid: super::parse_guid(&guid_str)?,
                name: row.get("name"),
            })
        })
        .collect()
}

/// Replace a book's author set, preserving the given order
pub async fn set_book_authors(
    conn: &mut SqliteConnection,
    book_id: Uuid,
    authors: &[Author],
) -> Result<()> {
    sqlx::query("DELETE FROM book_authors WHERE book_id = ?")
        .bind(book_id.to_string())
        .execute(&mut *conn)
        .await?;

    for (position, author) in authors.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO book_authors (book_id, author_id, position)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(book_id.to_string())
        .bind(author.guid.to_string())
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let pool = crate::db::test_pool().await;
        let mut conn = pool.acquire().await.expect("acquire");

        let first = find_or_create(&mut conn, "Frank Herbert")
            .await
            .expect("create author");
        let second = find_or_create(&mut conn, "Frank Herbert")
            .await
            .expect("find author");

        assert_eq!(first.guid, second.guid);
    }

    #[tokio::test]
    async fn test_name_lookup_is_case_sensitive() {
        let pool = crate::db::test_pool().await;
        let mut conn = pool.acquire().await.expect("acquire");

        find_or_create(&mut conn, "Ursula K. Le Guin")
            .await
            .expect("create author");

        let miss = find_by_name(&mut conn, "ursula k. le guin")
            .await
            .expect("lookup");
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_book_author_order_preserved() {
        let pool = crate::db::test_pool().await;
        let mut conn = pool.acquire().await.expect("acquire");

        let book_id = Uuid::new_v4();
        let a = find_or_create(&mut conn, "Terry Pratchett").await.unwrap();
        let b = find_or_create(&mut conn, "Neil Gaiman").await.unwrap();

        set_book_authors(&mut conn, book_id, &[a.clone(), b.clone()])
            .await
            .expect("link authors");

        let loaded = authors_for_book(&mut conn, book_id).await.expect("load");
        assert_eq!(
            loaded.iter().map(|x| x.name.as_str()).collect::<Vec<_>>(),
            vec!["Terry Pratchett", "Neil Gaiman"]
        );
    }
}
