//! Book database operations
//!
//! Book rows only; author and tag linkage live in the sibling modules.
//! ISBN, when present, is unique across books.

use booklib_common::Result;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Book record
#[derive(Debug, Clone)]
pub struct Book {
    pub guid: Uuid,
    pub title: String,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub series: Option<String>,
    pub publish_year: Option<i64>,
    pub cover_url: Option<String>,
}

impl Book {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            title: title.into(),
            isbn: None,
            description: None,
            series: None,
            publish_year: None,
            cover_url: None,
        }
    }
}

fn map_book_row(row: &SqliteRow) -> Result<Book> {
    let guid_str: String = row.get("guid");
    Ok(Book {
        guid: super::parse_guid(&guid_str)?,
        title: row.get("title"),
        isbn: row.get("isbn"),
        description: row.get("description"),
        series: row.get("series"),
        publish_year: row.get("publish_year"),
        cover_url: row.get("cover_url"),
    })
}

const BOOK_COLUMNS: &str = "guid, title, isbn, description, series, publish_year, cover_url";

/// Insert a new book row
pub async fn insert_book(conn: &mut SqliteConnection, book: &Book) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO books (
            guid, title, isbn, description, series, publish_year, cover_url,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(book.guid.to_string())
    .bind(&book.title)
    .bind(&book.isbn)
    .bind(&book.description)
    .bind(&book.series)
    .bind(book.publish_year)
    .bind(&book.cover_url)
    .execute(conn)
    .await?;

    Ok(())
}

/// Update an existing book row in place
pub async fn update_book(conn: &mut SqliteConnection, book: &Book) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE books SET
            title = ?,
            isbn = ?,
            description = ?,
            series = ?,
            publish_year = ?,
            cover_url = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&book.title)
    .bind(&book.isbn)
    .bind(&book.description)
    .bind(&book.series)
    .bind(book.publish_year)
    .bind(&book.cover_url)
    .bind(book.guid.to_string())
    .execute(conn)
    .await?;

    Ok(())
}

/// Load book by guid
pub async fn load_book(pool: &SqlitePool, guid: Uuid) -> Result<Option<Book>> {
    let row = sqlx::query(&format!("SELECT {} FROM books WHERE guid = ?", BOOK_COLUMNS))
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(map_book_row).transpose()
}

/// List all books ordered by title
pub async fn list_books(pool: &SqlitePool) -> Result<Vec<Book>> {
    let rows = sqlx::query(&format!("SELECT {} FROM books ORDER BY title", BOOK_COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(map_book_row).collect()
}

/// Load book by exact ISBN
pub async fn find_by_isbn(conn: &mut SqliteConnection, isbn: &str) -> Result<Option<Book>> {
    let row = sqlx::query(&format!("SELECT {} FROM books WHERE isbn = ?", BOOK_COLUMNS))
        .bind(isbn)
        .fetch_optional(conn)
        .await?;

    row.as_ref().map(map_book_row).transpose()
}

/// Load all books with an exact title match
pub async fn find_by_title(conn: &mut SqliteConnection, title: &str) -> Result<Vec<Book>> {
    let rows = sqlx::query(&format!("SELECT {} FROM books WHERE title = ?", BOOK_COLUMNS))
        .bind(title)
        .fetch_all(conn)
        .await?;

    rows.iter().map(map_book_row).collect()
}

/// Delete a book and its association rows
///
/// Returns false if no such book exists.
pub async fn delete_book(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await?;
    let guid_str = guid.to_string();

    for table in ["book_authors", "book_tags"] {
        sqlx::query(&format!("DELETE FROM {} WHERE book_id = ?", table))
            .bind(&guid_str)
            .execute(&mut *tx)
            .await?;
    }
    for table in ["comments", "ratings"] {
        sqlx::query(&format!("DELETE FROM {} WHERE book_id = ?", table))
            .bind(&guid_str)
            .execute(&mut *tx)
            .await?;
    }

    let result = sqlx::query("DELETE FROM books WHERE guid = ?")
        .bind(&guid_str)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}
