//! Read-only projections over the follow graph.

use circle_common::{AppError, AppResult};
use circle_db::{
    entities::{
        follow::{FollowStatus, PendingRequest},
        user::UserSummary,
    },
    repositories::{FollowRepository, UserRepository},
};
use serde::Serialize;

use crate::services::{identity::Principal, pagination::Pagination};

/// Outgoing edges of a user, split by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipSummary {
    /// Targets the user follows.
    pub following: Vec<i64>,
    /// Targets the user has a pending request toward.
    pub pending_requests: Vec<i64>,
}

/// Accepted edge counts for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationshipCounts {
    pub followers: u64,
    pub following: u64,
}

/// Graph query service.
#[derive(Clone)]
pub struct GraphQueryService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
}

impl GraphQueryService {
    /// Create a new graph query service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
        }
    }

    async fn ensure_user(&self, user_id: i64) -> AppResult<()> {
        if self.user_repo.exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::UserNotFound(user_id.to_string()))
        }
    }

    /// Users `user_id` follows.
    pub async fn list_following(
        &self,
        user_id: i64,
        page: Pagination,
    ) -> AppResult<Vec<UserSummary>> {
        self.ensure_user(user_id).await?;
        self.follow_repo
            .find_targets(user_id, FollowStatus::Accepted, page.limit, page.offset())
            .await
    }

    /// Users following `user_id`.
    pub async fn list_followers(
        &self,
        user_id: i64,
        page: Pagination,
    ) -> AppResult<Vec<UserSummary>> {
        self.ensure_user(user_id).await?;
        self.follow_repo
            .find_sources(user_id, FollowStatus::Accepted, page.limit, page.offset())
            .await
    }

    /// Pending requests addressed to `user_id`, oldest first.
    ///
    /// Only the owner may see them.
    pub async fn list_pending_requests(
        &self,
        principal: &Principal,
        user_id: i64,
    ) -> AppResult<Vec<PendingRequest>> {
        if principal.user_id() != user_id {
            tracing::warn!(
                caller_id = principal.user_id(),
                target_id = user_id,
                "Attempt to list another user's follow requests"
            );
            return Err(AppError::Forbidden(
                "Cannot view another user's follow requests".to_string(),
            ));
        }

        self.follow_repo.find_pending_incoming(user_id).await
    }

    /// Following and pending-outgoing target ids of a user.
    pub async fn relationship_summary(&self, user_id: i64) -> AppResult<RelationshipSummary> {
        let edges = self.follow_repo.find_by_source(user_id).await?;

        let mut summary = RelationshipSummary::default();
        for edge in edges {
            match edge.status {
                FollowStatus::Accepted => summary.following.push(edge.target_id),
                FollowStatus::Pending => summary.pending_requests.push(edge.target_id),
                FollowStatus::Rejected => {}
            }
        }

        Ok(summary)
    }

    /// Follower and following counts of a user.
    pub async fn relationship_counts(&self, user_id: i64) -> AppResult<RelationshipCounts> {
        self.ensure_user(user_id).await?;

        let followers = self
            .follow_repo
            .count_sources(user_id, FollowStatus::Accepted)
            .await?;
        let following = self
            .follow_repo
            .count_targets(user_id, FollowStatus::Accepted)
            .await?;

        Ok(RelationshipCounts {
            followers,
            following,
        })
    }
}
