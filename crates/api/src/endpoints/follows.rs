//! Follow graph endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use circle_common::{AppError, AppResult};
use circle_core::{
    ActionInput, ActionOutcome, Decision, DecisionOutcome, FollowAction, Pagination,
    RelationshipCounts, RelationshipSummary, pagination::DEFAULT_LIST_LIMIT,
};
use circle_db::entities::{follow::PendingRequest, user::UserSummary};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::PageParams;
use crate::{
    extractors::{AuthUser, ValidatedJson, parse_id},
    middleware::AppState,
    response::ApiResponse,
};

/// Follow action request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    #[validate(range(min = 1))]
    pub target_id: i64,

    #[validate(length(min = 1, max = 32))]
    pub action: String,

    pub is_request: Option<bool>,

    /// Must name the caller when present.
    pub user_id: Option<i64>,
}

/// Decision on a pending request.
#[derive(Debug, Deserialize, Validate)]
pub struct DecisionRequest {
    #[validate(length(min = 1, max = 16))]
    pub action: String,
}

/// One page of the users a user follows.
#[derive(Debug, Serialize)]
pub struct FollowingPage {
    pub page: u64,
    pub limit: u64,
    pub following: Vec<UserSummary>,
}

/// One page of a user's followers.
#[derive(Debug, Serialize)]
pub struct FollowersPage {
    pub page: u64,
    pub limit: u64,
    pub followers: Vec<UserSummary>,
}

/// Follow, request or unfollow a user.
async fn follow(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<FollowRequest>,
) -> AppResult<ApiResponse<ActionOutcome>> {
    if let Some(user_id) = req.user_id
        && user_id != principal.user_id()
    {
        tracing::warn!(
            caller_id = principal.user_id(),
            claimed_id = user_id,
            "Follow action on behalf of another user"
        );
        return Err(AppError::Forbidden(
            "userId does not match the authenticated user".to_string(),
        ));
    }

    let input = ActionInput {
        target_id: req.target_id,
        action: req.action.parse::<FollowAction>()?,
        is_request: req.is_request,
    };

    let outcome = state
        .follow_action_service
        .apply_action(&principal, input)
        .await?;
    Ok(ApiResponse::ok(outcome))
}

/// Following and pending-outgoing ids of a user.
async fn summary(
    AuthUser(_principal): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<RelationshipSummary>> {
    let user_id = parse_id(&user_id, "userId")?;
    let summary = state
        .graph_query_service
        .relationship_summary(user_id)
        .await?;
    Ok(ApiResponse::ok(summary))
}

/// Users a user follows.
async fn following_list(
    AuthUser(_principal): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<ApiResponse<FollowingPage>> {
    let user_id = parse_id(&user_id, "userId")?;
    let page = Pagination::from_params(
        params.page.as_deref(),
        params.limit.as_deref(),
        DEFAULT_LIST_LIMIT,
    );
    let following = state
        .graph_query_service
        .list_following(user_id, page)
        .await?;
    Ok(ApiResponse::ok(FollowingPage {
        page: page.page,
        limit: page.limit,
        following,
    }))
}

/// Users following a user.
async fn followers_list(
    AuthUser(_principal): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<ApiResponse<FollowersPage>> {
    let user_id = parse_id(&user_id, "userId")?;
    let page = Pagination::from_params(
        params.page.as_deref(),
        params.limit.as_deref(),
        DEFAULT_LIST_LIMIT,
    );
    let followers = state
        .graph_query_service
        .list_followers(user_id, page)
        .await?;
    Ok(ApiResponse::ok(FollowersPage {
        page: page.page,
        limit: page.limit,
        followers,
    }))
}

async fn counts(
    AuthUser(_principal): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<RelationshipCounts>> {
    let user_id = parse_id(&user_id, "userId")?;
    let counts = state
        .graph_query_service
        .relationship_counts(user_id)
        .await?;
    Ok(ApiResponse::ok(counts))
}

/// Pending requests addressed to the caller.
async fn pending_requests(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<PendingRequest>>> {
    let user_id = parse_id(&user_id, "userId")?;
    let requests = state
        .graph_query_service
        .list_pending_requests(&principal, user_id)
        .await?;
    Ok(ApiResponse::ok(requests))
}

/// Approve or reject a pending request.
async fn decide(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    ValidatedJson(req): ValidatedJson<DecisionRequest>,
) -> AppResult<ApiResponse<DecisionOutcome>> {
    let edge_id = parse_id(&request_id, "requestId")?;
    let decision = req.action.parse::<Decision>()?;

    let outcome = state
        .follow_approval_service
        .decide(&principal, edge_id, decision)
        .await?;
    Ok(ApiResponse::ok(outcome))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow", post(follow))
        .route("/following/{user_id}", get(summary))
        .route("/following/list/{user_id}", get(following_list))
        .route("/followers/list/{user_id}", get(followers_list))
        .route("/followers/count/{user_id}", get(counts))
        .route("/followreq/{user_id}", get(pending_requests))
        .route("/followreq/handle/{request_id}", post(decide))
}
