//! Follow approval service.

use std::str::FromStr;

use circle_common::{AppError, AppResult};
use circle_db::{entities::follow::FollowStatus, repositories::FollowRepository};
use serde::Serialize;

use crate::services::identity::Principal;

/// A decision on a pending follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Status the edge moves to.
    #[must_use]
    pub const fn status(self) -> FollowStatus {
        match self {
            Self::Approve => FollowStatus::Accepted,
            Self::Reject => FollowStatus::Rejected,
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Approve => "Request approved",
            Self::Reject => "Request rejected",
        }
    }
}

impl FromStr for Decision {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(AppError::Validation(format!("Invalid action: {other}"))),
        }
    }
}

/// Result of a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionOutcome {
    pub status: FollowStatus,
    pub message: String,
}

/// Follow approval service for business logic.
#[derive(Clone)]
pub struct FollowApprovalService {
    follow_repo: FollowRepository,
}

impl FollowApprovalService {
    /// Create a new follow approval service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository) -> Self {
        Self { follow_repo }
    }

    /// Approve or reject a pending request addressed to the principal.
    ///
    /// An unknown edge, an edge addressed to someone else and an edge that is no
    /// longer pending all report the same not-found error.
    pub async fn decide(
        &self,
        principal: &Principal,
        edge_id: i64,
        decision: Decision,
    ) -> AppResult<DecisionOutcome> {
        if edge_id < 1 {
            return Err(AppError::Validation("requestId must be a positive integer".to_string()));
        }

        let target_id = principal.user_id();
        let rows = self
            .follow_repo
            .decide_pending(edge_id, target_id, decision.status())
            .await?;

        if rows == 0 {
            tracing::debug!(edge_id, target_id, "No pending request matched decision");
            return Err(AppError::NotFound("Follow request not found".to_string()));
        }

        tracing::debug!(edge_id, target_id, ?decision, "Follow request decided");

        Ok(DecisionOutcome {
            status: decision.status(),
            message: decision.message().to_string(),
        })
    }
}
