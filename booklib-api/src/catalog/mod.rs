//! Catalog reconciliation
//!
//! The merge of caller input, prior book state, and freshly fetched
//! metadata into a final persisted record, plus the enrichment workflow
//! that drives the metadata providers.

pub mod reconcile;
pub mod service;

pub use reconcile::{BookInput, BookRecord, CatalogError, Reconciler, DEFAULT_AUTHOR_NAME};
pub use service::{CatalogService, CreateOutcome};
