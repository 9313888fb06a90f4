//! HTTP API handlers for booklib-api
//!
//! One module per resource; each exposes a `*_routes()` builder merged
//! into the application router.

pub mod books;
pub mod comments;
pub mod health;
pub mod providers;
pub mod ratings;
pub mod tags;
pub mod users;

pub use books::book_routes;
pub use comments::comment_routes;
pub use health::health_routes;
pub use providers::provider_routes;
pub use ratings::rating_routes;
pub use tags::tag_routes;
pub use users::user_routes;

use serde::Serialize;

/// Uniform "it worked" response for mutations without a richer payload
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}
