//! Metadata providers
//!
//! Pluggable ISBN lookup against third-party metadata services. Each
//! provider performs one bounded network lookup per request (no retries)
//! and returns a [`NormalizedRecord`] or a typed failure. Ordinary HTTP
//! error statuses map to [`ProviderError::Remote`], never a panic.
//!
//! Providers are registered in a [`ProviderRegistry`] built once at
//! startup and held immutably for the life of the process.

pub mod google_books;
pub mod normalize;
pub mod open_library;

pub use google_books::GoogleBooksProvider;
pub use normalize::NormalizedRecord;
pub use open_library::OpenLibraryProvider;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Lookup failure taxonomy
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has no record for this ISBN
    #[error("no record found for ISBN {isbn}")]
    NotFound { isbn: String },

    /// The provider answered with an HTTP error status
    #[error("provider returned HTTP {status}")]
    Remote { status: u16 },

    /// Connection, timeout or response-decoding failure
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Capability shared by all metadata providers
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Registry name, lowercase
    fn name(&self) -> &'static str;

    /// Look up a non-empty ISBN, returning a normalized record.
    ///
    /// Secondary lookups (e.g. author resolution) happen synchronously
    /// inside this call; partial failures there degrade to omitted
    /// fields rather than failing the whole lookup.
    async fn lookup(&self, isbn: &str) -> Result<NormalizedRecord, ProviderError>;
}

/// Name → provider map, populated at startup
///
/// Replaces the dynamic scan-and-instantiate plugin loading of earlier
/// prototypes with a statically known registry. Lookup is
/// case-insensitive and resolves legacy aliases.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn MetadataProvider>>,
    aliases: HashMap<String, String>,
    default_name: String,
}

/// Default provider when a request names none
pub const DEFAULT_PROVIDER: &str = "googlebooks";

impl ProviderRegistry {
    /// Registry with the built-in providers and legacy aliases
    pub fn builtin(default_name: Option<&str>) -> Self {
        let mut registry = Self::empty(default_name.unwrap_or(DEFAULT_PROVIDER));
        registry.register(Arc::new(OpenLibraryProvider::new()));
        registry.register(Arc::new(GoogleBooksProvider::new()));
        // Goodreads retired its lookup API; earlier callers are served
        // by Open Library instead.
        registry.alias("goodreads", "openlibrary");
        registry
    }

    /// Empty registry (tests register their own providers)
    pub fn empty(default_name: &str) -> Self {
        Self {
            providers: HashMap::new(),
            aliases: HashMap::new(),
            default_name: default_name.to_lowercase(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn MetadataProvider>) {
        self.providers
            .insert(provider.name().to_lowercase(), provider);
    }

    pub fn alias(&mut self, from: &str, to: &str) {
        self.aliases.insert(from.to_lowercase(), to.to_lowercase());
    }

    /// Resolve a provider by name, following aliases
    pub fn get(&self, name: &str) -> Option<Arc<dyn MetadataProvider>> {
        let key = name.to_lowercase();
        let key = self.aliases.get(&key).unwrap_or(&key);
        self.providers.get(key).cloned()
    }

    /// Resolve the requested provider, falling back to the default
    pub fn resolve(&self, requested: Option<&str>) -> Option<Arc<dyn MetadataProvider>> {
        match requested {
            Some(name) => self.get(name),
            None => self.get(&self.default_name),
        }
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Alias → target pairs, sorted by alias
    pub fn alias_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .aliases
            .iter()
            .map(|(a, t)| (a.clone(), t.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_contents() {
        let registry = ProviderRegistry::builtin(None);
        assert_eq!(registry.names(), vec!["googlebooks", "openlibrary"]);
        assert_eq!(registry.default_name(), "googlebooks");
    }

    #[test]
    fn test_goodreads_alias_resolves_to_open_library() {
        let registry = ProviderRegistry::builtin(None);
        let provider = registry.get("goodreads").expect("alias resolves");
        assert_eq!(provider.name(), "openlibrary");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = ProviderRegistry::builtin(None);
        assert!(registry.get("GoogleBooks").is_some());
        assert!(registry.get("OPENLIBRARY").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let registry = ProviderRegistry::builtin(Some("openlibrary"));
        let provider = registry.resolve(None).expect("default resolves");
        assert_eq!(provider.name(), "openlibrary");

        let explicit = registry.resolve(Some("googlebooks")).expect("explicit");
        assert_eq!(explicit.name(), "googlebooks");
    }
}
