//! API endpoints.

mod follows;
mod users;

use axum::Router;
use serde::Deserialize;

use crate::middleware::AppState;

/// Raw `page` / `limit` query parameters.
///
/// Kept as strings so malformed values fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new().merge(follows::router()).merge(users::router())
}
