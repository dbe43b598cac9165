//! User directory endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use circle_common::AppResult;
use circle_core::{Pagination, pagination::DEFAULT_DIRECTORY_LIMIT};
use circle_db::entities::user::UserSummary;

use super::PageParams;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// List every user except the caller.
async fn list(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let page = Pagination::from_params(
        params.page.as_deref(),
        params.limit.as_deref(),
        DEFAULT_DIRECTORY_LIMIT,
    );
    let users = state.user_service.list_users(&principal, page).await?;
    Ok(ApiResponse::ok(users))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users", get(list))
}
