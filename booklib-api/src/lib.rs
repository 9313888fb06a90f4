//! booklib-api library interface
//!
//! Exposes the application state and router for integration testing.

pub mod api;
pub mod catalog;
pub mod db;
pub mod error;
pub mod providers;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::catalog::CatalogService;
use crate::providers::ProviderRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Catalog operations (reconciler + provider registry)
    pub catalog: CatalogService,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            catalog: CatalogService::new(db.clone(), registry),
            db,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::book_routes())
        .merge(api::comment_routes())
        .merge(api::rating_routes())
        .merge(api::tag_routes())
        .merge(api::user_routes())
        .merge(api::provider_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
