//! Open Library provider
//!
//! Fetches edition metadata from the Open Library JSON API. Editions
//! reference authors by key, so each lookup performs secondary requests
//! to resolve author display names; an author that fails to resolve is
//! omitted rather than failing the whole lookup.
//!
//! # API Reference
//! - Edition: https://openlibrary.org/isbn/{isbn}.json
//! - Author: https://openlibrary.org/authors/{key}.json

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::normalize::{non_blank, year_from_date, NormalizedRecord, OneOrMany, TextOrValue};
use super::{MetadataProvider, ProviderError};

/// Open Library base URL
const OPEN_LIBRARY_URL: &str = "https://openlibrary.org";

/// Timeout for the edition lookup
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for each secondary author lookup
const AUTHOR_TIMEOUT: Duration = Duration::from_secs(5);

/// User-Agent header (Open Library asks clients to identify themselves)
const USER_AGENT: &str = "booklib/0.1.0 (https://github.com/booklib/booklib)";

/// Open Library metadata provider
pub struct OpenLibraryProvider {
    http_client: Client,
    base_url: String,
}

impl OpenLibraryProvider {
    pub fn new() -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .default_headers(headers)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: OPEN_LIBRARY_URL.to_string(),
        }
    }

    /// Resolve author reference keys to display names
    ///
    /// Tolerates partial failure: an unreachable or nameless author is
    /// skipped, never propagated as an error.
    async fn resolve_author_names(&self, refs: &[AuthorRef]) -> Vec<String> {
        let mut names = Vec::new();

        for author_ref in refs {
            let url = format!("{}{}.json", self.base_url, author_ref.key);
            let response = self
                .http_client
                .get(&url)
                .timeout(AUTHOR_TIMEOUT)
                .send()
                .await;

            let author: Option<OpenLibraryAuthor> = match response {
                Ok(resp) if resp.status().is_success() => resp.json().await.ok(),
                Ok(resp) => {
                    debug!(key = %author_ref.key, status = %resp.status(), "Author lookup failed");
                    None
                }
                Err(e) => {
                    debug!(key = %author_ref.key, error = %e, "Author lookup failed");
                    None
                }
            };

            if let Some(name) = author.and_then(|a| non_blank(a.name)) {
                names.push(name);
            }
        }

        names
    }
}

impl Default for OpenLibraryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataProvider for OpenLibraryProvider {
    fn name(&self) -> &'static str {
        "openlibrary"
    }

    async fn lookup(&self, isbn: &str) -> Result<NormalizedRecord, ProviderError> {
        let url = format!("{}/isbn/{}.json", self.base_url, isbn);
        debug!(%isbn, "Querying Open Library");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound {
                isbn: isbn.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Remote {
                status: status.as_u16(),
            });
        }

        let edition: OpenLibraryEdition = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let authors = self.resolve_author_names(&edition.authors).await;
        let record = normalize_edition(edition, authors);

        debug!(
            %isbn,
            title = ?record.title,
            authors = record.authors.len(),
            "Open Library lookup complete"
        );

        Ok(record)
    }
}

/// Map a raw Open Library edition into the normalized record
fn normalize_edition(edition: OpenLibraryEdition, authors: Vec<String>) -> NormalizedRecord {
    NormalizedRecord {
        title: non_blank(edition.title),
        authors,
        description: non_blank(edition.description.map(TextOrValue::into_text)),
        series: non_blank(edition.series.and_then(OneOrMany::into_first)),
        publish_year: edition.publish_date.as_deref().and_then(year_from_date),
        genres: edition
            .subjects
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect(),
        // Open Library editions carry cover ids, not URLs; left unset
        cover_url: None,
    }
}

// ============================================================================
// Open Library API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct OpenLibraryEdition {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<AuthorRef>,
    description: Option<TextOrValue>,
    series: Option<OneOrMany<String>>,
    publish_date: Option<String>,
    #[serde(default)]
    subjects: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryAuthor {
    name: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
