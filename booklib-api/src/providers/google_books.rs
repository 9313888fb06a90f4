//! Google Books provider
//!
//! Fetches volume metadata from the Google Books volumes API. Authors
//! arrive as plain display names, so no secondary lookups are needed.
//! Google Books does not expose series information.
//!
//! # API Reference
//! - Volumes: https://www.googleapis.com/books/v1/volumes?q=isbn:{isbn}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::normalize::{non_blank, year_from_date, NormalizedRecord};
use super::{MetadataProvider, ProviderError};

/// Google Books volumes endpoint
const GOOGLE_BOOKS_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Timeout for the volume lookup
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Google Books metadata provider
pub struct GoogleBooksProvider {
    http_client: Client,
    base_url: String,
}

impl GoogleBooksProvider {
    pub fn new() -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: GOOGLE_BOOKS_URL.to_string(),
        }
    }
}

impl Default for GoogleBooksProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataProvider for GoogleBooksProvider {
    fn name(&self) -> &'static str {
        "googlebooks"
    }

    async fn lookup(&self, isbn: &str) -> Result<NormalizedRecord, ProviderError> {
        let url = format!("{}?q=isbn:{}", self.base_url, isbn);
        debug!(%isbn, "Querying Google Books");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Remote {
                status: status.as_u16(),
            });
        }

        let volumes: VolumesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        // The volumes endpoint answers 200 with an empty item list for
        // unknown ISBNs
        let volume = volumes
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound {
                isbn: isbn.to_string(),
            })?;

        let record = normalize_volume(volume.volume_info);

        debug!(
            %isbn,
            title = ?record.title,
            authors = record.authors.len(),
            "Google Books lookup complete"
        );

        Ok(record)
    }
}

/// Map a raw Google Books volume into the normalized record
fn normalize_volume(info: VolumeInfo) -> NormalizedRecord {
    NormalizedRecord {
        title: non_blank(info.title),
        authors: info
            .authors
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect(),
        description: non_blank(info.description),
        // Google Books does not provide series info
        series: None,
        publish_year: info.published_date.as_deref().and_then(year_from_date),
        genres: info
            .categories
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect(),
        cover_url: non_blank(info.image_links.and_then(|links| links.thumbnail)),
    }
}

// ============================================================================
// Google Books API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo")]
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    description: Option<String>,
    published_date: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
