//! Catalog reconciler
//!
//! Resolves author and tag names to existing or newly created catalog
//! entries, detects duplicate books, merges caller input with fetched
//! metadata, and persists the result in a single transaction.
//!
//! Duplicate pre-checks here are a fast path; the storage layer's unique
//! constraints are the authoritative guard under concurrent requests,
//! and a constraint violation surfaced at commit time is mapped to the
//! same error kind as the pre-check.

use booklib_common::Error as CommonError;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::db::authors::{self, Author};
use crate::db::books::{self, Book};
use crate::db::tags::{self, Tag};
use crate::providers::normalize::{non_blank, NormalizedRecord};
use crate::providers::ProviderError;

/// Sentinel author for books created without any attribution.
///
/// Used only on first creation, never introduced by a recheck.
pub const DEFAULT_AUTHOR_NAME: &str = "No Author";

/// Reconciliation failure taxonomy
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Missing or malformed caller input
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A book with this ISBN already exists
    #[error("ISBN already exists; it belongs to {}, {}", .owner_authors.join(", "), .owner_title)]
    DuplicateIsbn {
        owner_title: String,
        owner_authors: Vec<String>,
    },

    /// A book with this title and the same author set already exists
    #[error("a book titled \"{title}\" by the same authors already exists")]
    DuplicateTitleAuthor { title: String },

    /// Metadata provider failure (fatal only for explicit rechecks)
    #[error("metadata provider unavailable: {0}")]
    Provider(#[from] ProviderError),

    /// Storage failure; the transaction was rolled back
    #[error("storage failure: {0}")]
    Storage(#[from] CommonError),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::Storage(e.into())
    }
}

/// Caller-supplied book fields (all optional; the reconciler merges them
/// with fetched metadata and, on recheck, prior state)
#[derive(Debug, Clone, Default)]
pub struct BookInput {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub series: Option<String>,
    pub publish_year: Option<i64>,
    pub cover_url: Option<String>,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
}

/// A persisted book together with its resolved relations
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub book: Book,
    pub authors: Vec<Author>,
    pub tags: Vec<Tag>,
}

/// Catalog reconciler over the SQLite pool
#[derive(Clone)]
pub struct Reconciler {
    pool: SqlitePool,
}

impl Reconciler {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[cfg(test)]
    pub(crate) fn pool_for_tests(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a book from caller input merged with optional fetched
    /// metadata.
    ///
    /// Field merge prefers the normalized value when present and
    /// non-empty, then the caller override. Authors come from the
    /// normalized record when non-empty, else from the caller, else the
    /// sentinel. Tags are the union of caller tags and fetched genres.
    pub async fn create_book(
        &self,
        input: BookInput,
        normalized: Option<&NormalizedRecord>,
    ) -> Result<BookRecord, CatalogError> {
        let empty = NormalizedRecord::default();
        let norm = normalized.unwrap_or(&empty);

        let title = non_blank(norm.title.clone())
            .or_else(|| non_blank(input.title.clone()))
            .map(|t| t.trim().to_string())
            .ok_or(CatalogError::Validation {
                field: "title",
                reason: "title must be non-empty".to_string(),
            })?;

        let author_names = resolve_author_names(&norm.authors, &input.authors, true);
        if author_names.is_empty() {
            return Err(CatalogError::Validation {
                field: "authors",
                reason: "at least one author is required".to_string(),
            });
        }

        let tag_names = union_tag_names(&input.tags, &norm.genres);

        let mut book = Book::new(title);
        book.isbn = non_blank(input.isbn.clone());
        book.description = non_blank(norm.description.clone())
            .or_else(|| non_blank(input.description.clone()));
        book.series = non_blank(norm.series.clone()).or_else(|| non_blank(input.series.clone()));
        book.publish_year = norm.publish_year.or(input.publish_year);
        book.cover_url =
            non_blank(norm.cover_url.clone()).or_else(|| non_blank(input.cover_url.clone()));

        let isbn_for_conflict = book.isbn.clone();
        let mut tx = self.pool.begin().await?;
        let outcome = create_in_tx(&mut tx, book, &author_names, &tag_names).await;

        match outcome {
            Ok(record) => {
                tx.commit().await?;
                debug!(book = %record.book.guid, title = %record.book.title, "Created book");
                Ok(record)
            }
            Err(err) => {
                // Rollback happens on drop; surface a lost duplicate race
                // as the same conflict the pre-check would have produced.
                drop(tx);
                Err(self.map_commit_race(err, isbn_for_conflict.as_deref()).await)
            }
        }
    }

    /// Re-enrich an existing book in place from a fresh normalized
    /// record.
    ///
    /// Non-empty fetched values overwrite; everything else is preserved.
    /// The author set is replaced only when the record names authors.
    /// Tags are additive only: the post-recheck tag set is a superset of
    /// the prior one.
    pub async fn recheck_book(
        &self,
        book: Book,
        normalized: &NormalizedRecord,
    ) -> Result<BookRecord, CatalogError> {
        let mut book = book;

        if let Some(title) = non_blank(normalized.title.clone()) {
            book.title = title.trim().to_string();
        }
        if let Some(description) = non_blank(normalized.description.clone()) {
            book.description = Some(description);
        }
        if let Some(series) = non_blank(normalized.series.clone()) {
            book.series = Some(series);
        }
        if let Some(year) = normalized.publish_year {
            book.publish_year = Some(year);
        }
        if let Some(cover_url) = non_blank(normalized.cover_url.clone()) {
            book.cover_url = Some(cover_url);
        }

        let replacement_authors = resolve_author_names(&normalized.authors, &[], false);
        let genre_names = union_tag_names(&[], &normalized.genres);

        let mut tx = self.pool.begin().await?;

        books::update_book(&mut tx, &book).await?;

        if !replacement_authors.is_empty() {
            let mut resolved = Vec::with_capacity(replacement_authors.len());
            for name in &replacement_authors {
                resolved.push(authors::find_or_create(&mut tx, name).await?);
            }
            authors::set_book_authors(&mut tx, book.guid, &resolved).await?;
        }

        for name in &genre_names {
            let tag = tags::find_or_create(&mut tx, name).await?;
            tags::link_book_tag(&mut tx, book.guid, tag.guid).await?;
        }

        let record = BookRecord {
            authors: authors::authors_for_book(&mut tx, book.guid).await?,
            tags: tags::tags_for_book(&mut tx, book.guid).await?,
            book,
        };

        tx.commit().await?;
        debug!(book = %record.book.guid, "Rechecked book");

        Ok(record)
    }

    /// Translate a lost creation race on the ISBN unique constraint into
    /// the same conflict error the pre-check produces
    async fn map_commit_race(&self, err: CatalogError, isbn: Option<&str>) -> CatalogError {
        let isbn = match isbn {
            Some(isbn) if is_isbn_unique_violation(&err) => isbn,
            _ => return err,
        };

        let mut conn = match self.pool.acquire().await {
            Ok(conn) => conn,
            Err(_) => return err,
        };

        match books::find_by_isbn(&mut conn, isbn).await {
            Ok(Some(owner)) => {
                let owner_authors = authors::authors_for_book(&mut conn, owner.guid)
                    .await
                    .map(|list| list.into_iter().map(|a| a.name).collect())
                    .unwrap_or_default();
                CatalogError::DuplicateIsbn {
                    owner_title: owner.title,
                    owner_authors,
                }
            }
            _ => err,
        }
    }
}

/// Build the target author name list: normalized names win, then caller
/// names (trimmed, empties dropped), then the sentinel on creation.
/// Duplicates collapse while preserving first-seen order.
fn resolve_author_names(
    normalized: &[String],
    overrides: &[String],
    allow_sentinel: bool,
) -> Vec<String> {
    let source: Vec<String> = if !normalized.is_empty() {
        normalized.to_vec()
    } else {
        overrides
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect()
    };

    let mut seen = HashSet::new();
    let mut names: Vec<String> = source
        .into_iter()
        .filter(|n| seen.insert(n.clone()))
        .collect();

    if names.is_empty() && allow_sentinel {
        names.push(DEFAULT_AUTHOR_NAME.to_string());
    }

    names
}

/// Union of caller tag names and fetched genre names, trimmed, empties
/// dropped, duplicates collapsed in first-seen order
fn union_tag_names(overrides: &[String], genres: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    overrides
        .iter()
        .chain(genres.iter())
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

/// Duplicate checks and persistence, all inside the caller's transaction
async fn create_in_tx(
    conn: &mut SqliteConnection,
    book: Book,
    author_names: &[String],
    tag_names: &[String],
) -> Result<BookRecord, CatalogError> {
    // Duplicate ISBN: the conflict message names the current owner
    if let Some(isbn) = &book.isbn {
        if let Some(owner) = books::find_by_isbn(&mut *conn, isbn).await? {
            let owner_authors = authors::authors_for_book(&mut *conn, owner.guid)
                .await?
                .into_iter()
                .map(|a| a.name)
                .collect();
            return Err(CatalogError::DuplicateIsbn {
                owner_title: owner.title,
                owner_authors,
            });
        }
    }

    // Duplicate title + identical author set. Author identity is the
    // exact name, so comparing name sets is equivalent to comparing
    // resolved identity sets.
    let target_set: HashSet<&str> = author_names.iter().map(String::as_str).collect();
    for existing in books::find_by_title(&mut *conn, &book.title).await? {
        let existing_names = authors::authors_for_book(&mut *conn, existing.guid).await?;
        let existing_set: HashSet<&str> =
            existing_names.iter().map(|a| a.name.as_str()).collect();
        if existing_set == target_set {
            return Err(CatalogError::DuplicateTitleAuthor {
                title: book.title.clone(),
            });
        }
    }

    let mut resolved_authors = Vec::with_capacity(author_names.len());
    for name in author_names {
        resolved_authors.push(authors::find_or_create(&mut *conn, name).await?);
    }

    books::insert_book(&mut *conn, &book).await?;
    authors::set_book_authors(&mut *conn, book.guid, &resolved_authors).await?;

    for name in tag_names {
        let tag = tags::find_or_create(&mut *conn, name).await?;
        tags::link_book_tag(&mut *conn, book.guid, tag.guid).await?;
    }

    let resolved_tags = tags::tags_for_book(&mut *conn, book.guid).await?;

    Ok(BookRecord {
        book,
        authors: resolved_authors,
        tags: resolved_tags,
    })
}

/// True when the error is a unique violation on books.isbn
fn is_isbn_unique_violation(err: &CatalogError) -> bool {
    let CatalogError::Storage(common) = err else {
        return false;
    };
    if !common.is_unique_violation() {
        return false;
    }
    let CommonError::Database(e) = common else {
        return false;
    };
    e.as_database_error()
        .map(|db| db.message().contains("books.isbn"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, authors: &[&str]) -> BookInput {
        BookInput {
            title: Some(title.to_string()),
            authors: authors.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    async fn reconciler() -> Reconciler {
        Reconciler::new(crate::db::test_pool().await)
    }

    #[tokio::test]
    async fn test_create_plain_book() {
        // Create with {title: "Dune", authors: ["Frank Herbert"]}, no
        // ISBN, no provider: one author, no tags.
        let reconciler = reconciler().await;

        let record = reconciler
            .create_book(input("Dune", &["Frank Herbert"]), None)
            .await
            .expect("create");

        assert_eq!(record.book.title, "Dune");
        assert_eq!(record.authors.len(), 1);
        assert_eq!(record.authors[0].name, "Frank Herbert");
        assert!(record.tags.is_empty());
        assert!(record.book.isbn.is_none());
    }

    #[tokio::test]
    async fn test_create_without_title_rejected() {
        let reconciler = reconciler().await;

        let err = reconciler
            .create_book(input("   ", &["Frank Herbert"]), None)
            .await
            .expect_err("blank title");

        assert!(matches!(
            err,
            CatalogError::Validation { field: "title", .. }
        ));
    }

    #[tokio::test]
    async fn test_create_without_authors_uses_sentinel() {
        let reconciler = reconciler().await;

        let record = reconciler
            .create_book(input("Anonymous Work", &[]), None)
            .await
            .expect("create");

        assert_eq!(record.authors.len(), 1);
        assert_eq!(record.authors[0].name, DEFAULT_AUTHOR_NAME);
    }

    #[tokio::test]
    async fn test_normalized_fields_win_over_overrides() {
        let reconciler = reconciler().await;

        let normalized = NormalizedRecord {
            title: Some("Dune".to_string()),
            authors: vec!["Frank Herbert".to_string()],
            description: Some("A desert planet.".to_string()),
            publish_year: Some(1965),
            genres: vec!["Science Fiction".to_string()],
            ..Default::default()
        };

        let mut overrides = input("My Placeholder Title", &["Someone Else"]);
        overrides.isbn = Some("9780441013593".to_string());
        overrides.description = Some("caller description".to_string());
        overrides.tags = vec!["Classics".to_string()];

        let record = reconciler
            .create_book(overrides, Some(&normalized))
            .await
            .expect("create");

        assert_eq!(record.book.title, "Dune");
        assert_eq!(record.book.description.as_deref(), Some("A desert planet."));
        assert_eq!(record.book.publish_year, Some(1965));
        assert_eq!(record.authors[0].name, "Frank Herbert");

        // Tags are the union of caller tags and fetched genres
        let tag_names: Vec<&str> = record.tags.iter().map(|t| t.name.as_str()).collect();
        assert!(tag_names.contains(&"Classics"));
        assert!(tag_names.contains(&"Science Fiction"));
    }

    #[tokio::test]
    async fn test_duplicate_isbn_rejected_regardless_of_title() {
        let reconciler = reconciler().await;

        let mut first = input("Dune", &["Frank Herbert"]);
        first.isbn = Some("9780441013593".to_string());
        reconciler.create_book(first, None).await.expect("create");

        let mut second = input("A Different Title", &["Someone Else"]);
        second.isbn = Some("9780441013593".to_string());
        let err = reconciler
            .create_book(second, None)
            .await
            .expect_err("duplicate isbn");

        match err {
            CatalogError::DuplicateIsbn {
                owner_title,
                owner_authors,
            } => {
                assert_eq!(owner_title, "Dune");
                assert_eq!(owner_authors, vec!["Frank Herbert"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        // The conflict message names the current owner
        let mut third = input("Yet Another", &["X"]);
        third.isbn = Some("9780441013593".to_string());
        let message = reconciler
            .create_book(third, None)
            .await
            .expect_err("duplicate isbn")
            .to_string();
        assert!(message.contains("Frank Herbert"));
        assert!(message.contains("Dune"));
    }

    #[tokio::test]
    async fn test_duplicate_title_same_author_set_rejected() {
        let reconciler = reconciler().await;

        reconciler
            .create_book(input("Good Omens", &["Terry Pratchett", "Neil Gaiman"]), None)
            .await
            .expect("create");

        // Same title, same author set (order irrelevant): rejected
        let err = reconciler
            .create_book(input("Good Omens", &["Neil Gaiman", "Terry Pratchett"]), None)
            .await
            .expect_err("duplicate title+authors");
        assert!(matches!(err, CatalogError::DuplicateTitleAuthor { .. }));

        // Changing even one author allows creation
        reconciler
            .create_book(input("Good Omens", &["Neil Gaiman"]), None)
            .await
            .expect("different author set is allowed");
    }

    #[tokio::test]
    async fn test_author_names_trimmed_and_deduped() {
        let reconciler = reconciler().await;

        let record = reconciler
            .create_book(
                input("Dune", &["  Frank Herbert  ", "Frank Herbert", ""]),
                None,
            )
            .await
            .expect("create");

        assert_eq!(record.authors.len(), 1);
        assert_eq!(record.authors[0].name, "Frank Herbert");
    }

    #[tokio::test]
    async fn test_recheck_overwrites_non_empty_and_preserves_rest() {
        let reconciler = reconciler().await;

        let mut initial = input("Dune", &["Frank Herbert"]);
        initial.isbn = Some("9780441013593".to_string());
        initial.series = Some("Dune Chronicles".to_string());
        initial.tags = vec!["Classics".to_string()];
        let created = reconciler.create_book(initial, None).await.expect("create");

        let normalized = NormalizedRecord {
            publish_year: Some(1965),
            genres: vec!["Science Fiction".to_string()],
            ..Default::default()
        };

        let rechecked = reconciler
            .recheck_book(created.book.clone(), &normalized)
            .await
            .expect("recheck");

        // Fetched year lands, everything absent from the record survives
        assert_eq!(rechecked.book.publish_year, Some(1965));
        assert_eq!(rechecked.book.title, "Dune");
        assert_eq!(rechecked.book.series.as_deref(), Some("Dune Chronicles"));
        assert_eq!(rechecked.authors[0].name, "Frank Herbert");

        // Tag set is a superset of the prior set
        let tag_names: Vec<&str> = rechecked.tags.iter().map(|t| t.name.as_str()).collect();
        assert!(tag_names.contains(&"Classics"));
        assert!(tag_names.contains(&"Science Fiction"));
    }

    #[tokio::test]
    async fn test_recheck_replaces_authors_only_when_provided() {
        let reconciler = reconciler().await;

        let created = reconciler
            .create_book(input("Dune", &["F. Herbert"]), None)
            .await
            .expect("create");

        // Empty author list in the record: keep the existing set
        let keep = reconciler
            .recheck_book(created.book.clone(), &NormalizedRecord::default())
            .await
            .expect("recheck");
        assert_eq!(keep.authors[0].name, "F. Herbert");

        // Non-empty author list: replace, not merge
        let replace = reconciler
            .recheck_book(
                keep.book.clone(),
                &NormalizedRecord {
                    authors: vec!["Frank Herbert".to_string()],
                    ..Default::default()
                },
            )
            .await
            .expect("recheck");
        assert_eq!(replace.authors.len(), 1);
        assert_eq!(replace.authors[0].name, "Frank Herbert");
    }

    #[tokio::test]
    async fn test_recheck_never_introduces_sentinel() {
        let reconciler = reconciler().await;

        let created = reconciler
            .create_book(input("Dune", &["Frank Herbert"]), None)
            .await
            .expect("create");

        let rechecked = reconciler
            .recheck_book(created.book.clone(), &NormalizedRecord::default())
            .await
            .expect("recheck");

        let names: Vec<&str> = rechecked.authors.iter().map(|a| a.name.as_str()).collect();
        assert!(!names.contains(&DEFAULT_AUTHOR_NAME));
        assert_eq!(names, vec!["Frank Herbert"]);
    }

    #[tokio::test]
    async fn test_find_or_create_reuses_authors_across_books() {
        let reconciler = reconciler().await;

        let first = reconciler
            .create_book(input("Dune", &["Frank Herbert"]), None)
            .await
            .expect("create");
        let second = reconciler
            .create_book(input("Dune Messiah", &["Frank Herbert"]), None)
            .await
            .expect("create");

        assert_eq!(first.authors[0].guid, second.authors[0].guid);
    }
}
