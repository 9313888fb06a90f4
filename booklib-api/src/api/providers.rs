//! Provider API handlers
//!
//! Read-only view of the provider registry plus a direct lookup
//! endpoint that returns the normalized record without touching the
//! catalog.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::providers::{NormalizedRecord, ProviderError};
use crate::catalog::CatalogError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ProviderAlias {
    pub alias: String,
    pub target: String,
}

/// GET /providers response
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<String>,
    pub aliases: Vec<ProviderAlias>,
    pub default: String,
}

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub isbn: String,
}

/// GET /providers
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    let registry = state.catalog.registry();
    Json(ProvidersResponse {
        providers: registry.names(),
        aliases: registry
            .alias_pairs()
            .into_iter()
            .map(|(alias, target)| ProviderAlias { alias, target })
            .collect(),
        default: registry.default_name().to_string(),
    })
}

/// POST /providers/:name/lookup
///
/// Normalized metadata for an ISBN, straight from the named provider.
pub async fn lookup(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<LookupRequest>,
) -> ApiResult<Json<NormalizedRecord>> {
    let record = state
        .catalog
        .lookup(&name, &request.isbn)
        .await
        .map_err(|e| match e {
            // A provider miss on a direct lookup is a 404, not a 502
            CatalogError::Provider(ProviderError::NotFound { isbn }) => {
                ApiError::NotFound(format!("no record found for ISBN {}", isbn))
            }
            other => other.into(),
        })?;

    Ok(Json(record))
}

/// Build provider routes
pub fn provider_routes() -> Router<AppState> {
    Router::new()
        .route("/providers", get(list_providers))
        .route("/providers/:name/lookup", post(lookup))
}
