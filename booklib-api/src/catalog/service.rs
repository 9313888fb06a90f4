//! Catalog service: enrichment workflow over the reconciler
//!
//! Drives the metadata providers and feeds their records into the
//! reconciler. Provider failure semantics differ by operation: during
//! creation the lookup degrades to "no enrichment" with a non-fatal
//! warning, while an explicit recheck fails outright, since the caller
//! asked for fresh data and got none.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::books::Book;
use crate::providers::{NormalizedRecord, ProviderRegistry};
use sqlx::SqlitePool;

use super::reconcile::{BookInput, BookRecord, CatalogError, Reconciler};

/// Result of a creation, with the enrichment warning when the provider
/// lookup failed non-fatally
#[derive(Debug)]
pub struct CreateOutcome {
    pub record: BookRecord,
    pub enrichment_warning: Option<String>,
}

/// Catalog operations exposed to the request-handling layer
#[derive(Clone)]
pub struct CatalogService {
    reconciler: Reconciler,
    registry: Arc<ProviderRegistry>,
}

impl CatalogService {
    pub fn new(pool: SqlitePool, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            reconciler: Reconciler::new(pool),
            registry,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Create a book, enriching from a metadata provider when the input
    /// carries an ISBN.
    ///
    /// Provider failures never abort creation; the book is created from
    /// the caller-supplied fields alone and the failure is reported as a
    /// warning alongside the result.
    pub async fn create_book(
        &self,
        input: BookInput,
        provider_name: Option<&str>,
    ) -> Result<CreateOutcome, CatalogError> {
        let mut warning = None;

        let normalized = match input.isbn.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(isbn) => match self.registry.resolve(provider_name) {
                Some(provider) => match provider.lookup(isbn).await {
                    Ok(record) => {
                        debug!(%isbn, provider = provider.name(), "Enrichment lookup succeeded");
                        Some(record)
                    }
                    Err(e) => {
                        warn!(%isbn, provider = provider.name(), error = %e,
                            "Enrichment lookup failed; creating from caller fields only");
                        warning = Some(format!(
                            "enrichment via {} failed: {}",
                            provider.name(),
                            e
                        ));
                        None
                    }
                },
                None => {
                    let requested = provider_name.unwrap_or_default();
                    warn!(provider = requested, "Unknown metadata provider requested");
                    warning = Some(format!("unknown metadata provider: {}", requested));
                    None
                }
            },
            None => None,
        };

        let record = self.reconciler.create_book(input, normalized.as_ref()).await?;

        Ok(CreateOutcome {
            record,
            enrichment_warning: warning,
        })
    }

    /// Re-run enrichment for an existing book against its stored ISBN.
    ///
    /// Fails when the book has no ISBN, the provider is unknown, or the
    /// lookup fails; the book is left unmodified in every failure case.
    pub async fn recheck_book(
        &self,
        book: Book,
        provider_name: Option<&str>,
    ) -> Result<BookRecord, CatalogError> {
        let isbn = book
            .isbn
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or(CatalogError::Validation {
                field: "isbn",
                reason: "book does not have an ISBN".to_string(),
            })?;

        let provider =
            self.registry
                .resolve(provider_name)
                .ok_or_else(|| CatalogError::Validation {
                    field: "provider",
                    reason: format!(
                        "unknown metadata provider: {}",
                        provider_name.unwrap_or_default()
                    ),
                })?;

        let normalized = provider.lookup(&isbn).await?;

        self.reconciler.recheck_book(book, &normalized).await
    }

    /// Direct normalized lookup, bypassing the reconciler
    pub async fn lookup(
        &self,
        provider_name: &str,
        isbn: &str,
    ) -> Result<NormalizedRecord, CatalogError> {
        let provider = self
            .registry
            .get(provider_name)
            .ok_or_else(|| CatalogError::Validation {
                field: "provider",
                reason: format!("unknown metadata provider: {}", provider_name),
            })?;

        if isbn.trim().is_empty() {
            return Err(CatalogError::Validation {
                field: "isbn",
                reason: "isbn must be non-empty".to_string(),
            });
        }

        Ok(provider.lookup(isbn).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{MetadataProvider, ProviderError};
    use async_trait::async_trait;

    /// Test double: serves a canned record or a canned failure
    pub(crate) struct StaticProvider {
        record: Option<NormalizedRecord>,
    }

    impl StaticProvider {
        pub(crate) fn with_record(record: NormalizedRecord) -> Self {
            Self {
                record: Some(record),
            }
        }

        pub(crate) fn failing() -> Self {
            Self { record: None }
        }
    }

    #[async_trait]
    impl MetadataProvider for StaticProvider {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn lookup(&self, isbn: &str) -> Result<NormalizedRecord, ProviderError> {
            match &self.record {
                Some(record) => Ok(record.clone()),
                None => Err(ProviderError::NotFound {
                    isbn: isbn.to_string(),
                }),
            }
        }
    }

    async fn service_with(provider: StaticProvider) -> CatalogService {
        let pool = crate::db::test_pool().await;
        let mut registry = ProviderRegistry::empty("static");
        registry.register(Arc::new(provider));
        CatalogService::new(pool, Arc::new(registry))
    }

    fn dune_input(isbn: Option<&str>) -> BookInput {
        BookInput {
            title: Some("Dune".to_string()),
            isbn: isbn.map(|s| s.to_string()),
            authors: vec!["Frank Herbert".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_enriches_from_provider() {
        let service = service_with(StaticProvider::with_record(NormalizedRecord {
            publish_year: Some(1965),
            genres: vec!["Science Fiction".to_string()],
            ..Default::default()
        }))
        .await;

        let outcome = service
            .create_book(dune_input(Some("9780441013593")), None)
            .await
            .expect("create");

        assert!(outcome.enrichment_warning.is_none());
        assert_eq!(outcome.record.book.publish_year, Some(1965));
        assert_eq!(outcome.record.tags.len(), 1);
    }

    #[tokio::test]
    async fn test_create_degrades_when_provider_fails() {
        let service = service_with(StaticProvider::failing()).await;

        let outcome = service
            .create_book(dune_input(Some("9780441013593")), None)
            .await
            .expect("create must still succeed");

        let warning = outcome.enrichment_warning.expect("warning expected");
        assert!(warning.contains("static"));
        assert_eq!(outcome.record.book.title, "Dune");
        assert!(outcome.record.book.publish_year.is_none());
    }

    #[tokio::test]
    async fn test_create_without_isbn_skips_lookup() {
        let service = service_with(StaticProvider::failing()).await;

        let outcome = service
            .create_book(dune_input(None), None)
            .await
            .expect("create");

        assert!(outcome.enrichment_warning.is_none());
    }

    #[tokio::test]
    async fn test_recheck_fails_without_isbn() {
        let service = service_with(StaticProvider::failing()).await;

        let created = service
            .create_book(dune_input(None), None)
            .await
            .expect("create");

        let err = service
            .recheck_book(created.record.book, None)
            .await
            .expect_err("recheck without isbn");

        assert!(matches!(
            err,
            CatalogError::Validation { field: "isbn", .. }
        ));
    }

    #[tokio::test]
    async fn test_recheck_provider_failure_is_fatal_and_nonmutating() {
        let service = service_with(StaticProvider::failing()).await;

        let created = service
            .create_book(dune_input(Some("9780441013593")), None)
            .await
            .expect("create");
        // Ignore the creation-time warning; the book exists
        let book_id = created.record.book.guid;

        let err = service
            .recheck_book(created.record.book, None)
            .await
            .expect_err("recheck must fail");
        assert!(matches!(err, CatalogError::Provider(_)));

        // Book left unmodified
        let pool = service.reconciler.pool_for_tests();
        let book = crate::db::books::load_book(pool, book_id)
            .await
            .expect("load")
            .expect("book");
        assert_eq!(book.title, "Dune");
        assert!(book.publish_year.is_none());
    }

    #[tokio::test]
    async fn test_direct_lookup_unknown_provider() {
        let service = service_with(StaticProvider::failing()).await;

        let err = service
            .lookup("nonexistent", "9780441013593")
            .await
            .expect_err("unknown provider");
        assert!(matches!(
            err,
            CatalogError::Validation {
                field: "provider",
                ..
            }
        ));
    }
}
