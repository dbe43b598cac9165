//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use circle_common::config::AuthConfig;
use circle_core::{
    FollowActionService, FollowApprovalService, GraphQueryService, IdentityService, UserService,
};
use circle_db::repositories::{FollowRepository, UserRepository};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub identity_service: IdentityService,
    pub follow_action_service: FollowActionService,
    pub follow_approval_service: FollowApprovalService,
    pub graph_query_service: GraphQueryService,
    pub user_service: UserService,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, auth: &AuthConfig) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let follow_repo = FollowRepository::new(db);

        Self {
            identity_service: IdentityService::new(user_repo.clone(), auth),
            follow_action_service: FollowActionService::new(
                follow_repo.clone(),
                user_repo.clone(),
            ),
            follow_approval_service: FollowApprovalService::new(follow_repo.clone()),
            graph_query_service: GraphQueryService::new(follow_repo, user_repo.clone()),
            user_service: UserService::new(user_repo),
        }
    }
}

/// Authentication middleware.
///
/// A verified caller is stored as a `Principal` extension. Requests without a
/// usable token pass through unauthenticated and are rejected by `AuthUser`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        match state.identity_service.verify(&token).await {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
            }
            Err(e) if e.is_server_error() => return e.into_response(),
            Err(e) => tracing::debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}
