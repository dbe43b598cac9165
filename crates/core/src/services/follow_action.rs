//! Follow action service.
//!
//! Applies follow, follow-request and unfollow actions from the principal
//! toward a target user. Each call issues at most a few single-row statements
//! against the edge store and never holds a lock.

use std::str::FromStr;

use circle_common::{AppError, AppResult};
use circle_db::{
    entities::follow::FollowStatus,
    repositories::{FollowRepository, UserRepository},
};
use serde::Serialize;

use crate::services::identity::Principal;

/// Requested action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowAction {
    /// Remove the edge in whatever state it is.
    Unfollow,
    /// Follow directly or send a request, depending on the target.
    FollowOrRequest,
}

impl FromStr for FollowAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = s.trim();
        if action.is_empty() {
            return Err(AppError::Validation("action is required".to_string()));
        }
        if action.eq_ignore_ascii_case("unfollow") {
            Ok(Self::Unfollow)
        } else {
            Ok(Self::FollowOrRequest)
        }
    }
}

/// Input for [`FollowActionService::apply_action`].
#[derive(Debug, Clone, Copy)]
pub struct ActionInput {
    pub target_id: i64,
    pub action: FollowAction,
    /// `None` lets the target's account type decide.
    pub is_request: Option<bool>,
}

/// What an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Resent,
    Unfollowed,
    Requested,
    Followed,
    AlreadyRequested,
    AlreadyFollowing,
}

impl ActionKind {
    /// Whether the action changed the edge store.
    #[must_use]
    pub const fn success(self) -> bool {
        !matches!(self, Self::AlreadyRequested | Self::AlreadyFollowing)
    }

    /// Human readable reply.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Resent => "Follow request sent again",
            Self::Unfollowed => "Unfollowed / Request cancelled",
            Self::Requested => "Follow request sent",
            Self::Followed => "Now following",
            Self::AlreadyRequested => "Request already sent",
            Self::AlreadyFollowing => "Already following",
        }
    }
}

/// Result of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    #[serde(skip)]
    pub kind: ActionKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FollowStatus>,
    pub message: String,
}

impl ActionOutcome {
    fn new(kind: ActionKind, status: Option<FollowStatus>) -> Self {
        Self {
            kind,
            success: kind.success(),
            status,
            message: kind.message().to_string(),
        }
    }
}

/// Follow action service for business logic.
#[derive(Clone)]
pub struct FollowActionService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
}

impl FollowActionService {
    /// Create a new follow action service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
        }
    }

    /// Apply an action from the principal toward `input.target_id`.
    ///
    /// A rejected edge is moved back to pending before anything else, whatever
    /// the action.
    pub async fn apply_action(
        &self,
        principal: &Principal,
        input: ActionInput,
    ) -> AppResult<ActionOutcome> {
        let source_id = principal.user_id();
        let target_id = input.target_id;

        if target_id < 1 {
            return Err(AppError::Validation("targetId must be a positive integer".to_string()));
        }
        if source_id == target_id {
            return Err(AppError::Validation("Cannot follow yourself".to_string()));
        }

        if self
            .follow_repo
            .reactivate_rejected(source_id, target_id)
            .await?
            > 0
        {
            tracing::debug!(source_id, target_id, "Rejected follow request re-sent");
            return Ok(ActionOutcome::new(ActionKind::Resent, Some(FollowStatus::Pending)));
        }

        if input.action == FollowAction::Unfollow {
            let removed = self.follow_repo.delete(source_id, target_id).await?;
            tracing::debug!(source_id, target_id, removed, "Unfollowed");
            return Ok(ActionOutcome::new(ActionKind::Unfollowed, None));
        }

        let is_request = match input.is_request {
            Some(is_request) => {
                if !self.user_repo.exists(target_id).await? {
                    return Err(AppError::UserNotFound(target_id.to_string()));
                }
                is_request
            }
            None => self
                .user_repo
                .get_by_id(target_id)
                .await?
                .account_type
                .requires_approval(),
        };

        let status = if is_request {
            FollowStatus::Pending
        } else {
            FollowStatus::Accepted
        };

        if self
            .follow_repo
            .upsert_new(source_id, target_id, status)
            .await?
        {
            tracing::debug!(source_id, target_id, ?status, "Follow edge created");
            let kind = if is_request {
                ActionKind::Requested
            } else {
                ActionKind::Followed
            };
            return Ok(ActionOutcome::new(kind, Some(status)));
        }

        // Upsert-miss: report what is actually stored
        let existing = self
            .follow_repo
            .get(source_id, target_id)
            .await?
            .map(|edge| edge.status);

        let kind = match existing {
            Some(FollowStatus::Accepted) => ActionKind::AlreadyFollowing,
            Some(FollowStatus::Pending) => ActionKind::AlreadyRequested,
            Some(FollowStatus::Rejected) | None if is_request => ActionKind::AlreadyRequested,
            Some(FollowStatus::Rejected) | None => ActionKind::AlreadyFollowing,
        };

        // A rejected row here lost a race with a decision; it has no status to report
        let status = existing.filter(|status| *status != FollowStatus::Rejected);
        Ok(ActionOutcome::new(kind, status))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::follow_approval::{Decision, FollowApprovalService};
    use chrono::Utc;
    use circle_db::entities::{follow, user, user::AccountType};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;

    fn create_test_user(id: i64, account_type: AccountType) -> user::Model {
        user::Model {
            id,
            name: format!("user{id}"),
            email: format!("user{id}@example.com"),
            account_type,
            profile_pic: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_edge(user_id: i64, target_id: i64, status: FollowStatus) -> follow::Model {
        follow::Model {
            id: 1,
            user_id,
            target_id,
            status,
            created_at: Utc::now().into(),
        }
    }

    fn exec_result(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn empty_db() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn service(follow_db: MockDatabase, user_db: MockDatabase) -> FollowActionService {
        FollowActionService::new(
            FollowRepository::new(Arc::new(follow_db.into_connection())),
            UserRepository::new(Arc::new(user_db.into_connection())),
        )
    }

    fn follow_input(target_id: i64, is_request: Option<bool>) -> ActionInput {
        ActionInput {
            target_id,
            action: FollowAction::FollowOrRequest,
            is_request,
        }
    }

    #[test]
    fn test_parse_action() {
        assert_eq!("unfollow".parse::<FollowAction>().unwrap(), FollowAction::Unfollow);
        assert_eq!("Unfollow".parse::<FollowAction>().unwrap(), FollowAction::Unfollow);
        assert_eq!("follow".parse::<FollowAction>().unwrap(), FollowAction::FollowOrRequest);
        assert_eq!("request".parse::<FollowAction>().unwrap(), FollowAction::FollowOrRequest);
        assert!(matches!("  ".parse::<FollowAction>(), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_self_follow_rejected_before_store_access() {
        let service = FollowActionService::new(
            FollowRepository::new(empty_db()),
            UserRepository::new(empty_db()),
        );

        let result = service
            .apply_action(&Principal::new(1), follow_input(1, Some(false)))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_follow_public_user() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0), exec_result(1)]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(2, AccountType::Public)]]),
        );

        let outcome = service
            .apply_action(&Principal::new(1), follow_input(2, None))
            .await
            .unwrap();

        assert_eq!(outcome.kind, ActionKind::Followed);
        assert!(outcome.success);
        assert_eq!(outcome.status, Some(FollowStatus::Accepted));
        assert_eq!(outcome.message, "Now following");
    }

    #[tokio::test]
    async fn test_private_user_gets_request() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0), exec_result(1)]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(3, AccountType::Private)]]),
        );

        let outcome = service
            .apply_action(&Principal::new(1), follow_input(3, None))
            .await
            .unwrap();

        assert_eq!(outcome.kind, ActionKind::Requested);
        assert_eq!(outcome.status, Some(FollowStatus::Pending));
        assert_eq!(outcome.message, "Follow request sent");
    }

    #[tokio::test]
    async fn test_second_request_reports_already_sent() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0), exec_result(0)])
                .append_query_results([[create_test_edge(1, 3, FollowStatus::Pending)]]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
                maplit::btreemap! { "num_items" => Value::BigInt(Some(1)) },
            ]]),
        );

        let outcome = service
            .apply_action(&Principal::new(1), follow_input(3, Some(true)))
            .await
            .unwrap();

        assert_eq!(outcome.kind, ActionKind::AlreadyRequested);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Request already sent");
    }

    #[tokio::test]
    async fn test_request_on_accepted_edge_reports_already_following() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0), exec_result(0)])
                .append_query_results([[create_test_edge(1, 2, FollowStatus::Accepted)]]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
                maplit::btreemap! { "num_items" => Value::BigInt(Some(1)) },
            ]]),
        );

        let outcome = service
            .apply_action(&Principal::new(1), follow_input(2, Some(true)))
            .await
            .unwrap();

        assert_eq!(outcome.kind, ActionKind::AlreadyFollowing);
        assert_eq!(outcome.status, Some(FollowStatus::Accepted));
    }

    #[tokio::test]
    async fn test_vanished_edge_falls_back_to_request_flag() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0), exec_result(0)])
                .append_query_results([Vec::<follow::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
                maplit::btreemap! { "num_items" => Value::BigInt(Some(1)) },
            ]]),
        );

        let outcome = service
            .apply_action(&Principal::new(1), follow_input(2, Some(false)))
            .await
            .unwrap();

        assert_eq!(outcome.kind, ActionKind::AlreadyFollowing);
        assert!(outcome.status.is_none());
    }

    #[tokio::test]
    async fn test_rejected_read_back_reports_no_status() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0), exec_result(0)])
                .append_query_results([[create_test_edge(1, 3, FollowStatus::Rejected)]]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
                maplit::btreemap! { "num_items" => Value::BigInt(Some(1)) },
            ]]),
        );

        let outcome = service
            .apply_action(&Principal::new(1), follow_input(3, Some(true)))
            .await
            .unwrap();

        assert_eq!(outcome.kind, ActionKind::AlreadyRequested);
        assert!(!outcome.success);
        assert!(outcome.status.is_none());

        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("status").is_none());
    }

    #[tokio::test]
    async fn test_rejected_request_can_be_sent_again() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(1), exec_result(1)])
                .into_connection(),
        );
        let approvals = FollowApprovalService::new(FollowRepository::new(db.clone()));
        let actions =
            FollowActionService::new(FollowRepository::new(db.clone()), UserRepository::new(empty_db()));

        let decided = approvals
            .decide(&Principal::new(3), 7, Decision::Reject)
            .await
            .unwrap();
        assert_eq!(decided.status, FollowStatus::Rejected);

        let outcome = actions
            .apply_action(&Principal::new(1), follow_input(3, None))
            .await
            .unwrap();

        assert_eq!(outcome.kind, ActionKind::Resent);
        assert!(outcome.success);
        assert_eq!(outcome.status, Some(FollowStatus::Pending));

        drop(approvals);
        drop(actions);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 2);
        let sql = format!("{log:?}");
        assert!(sql.contains("rejected"));
        assert!(sql.contains("pending"));
    }

    #[tokio::test]
    async fn test_rejected_edge_is_resent_first() {
        let service = FollowActionService::new(
            FollowRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_exec_results([exec_result(1)])
                    .into_connection(),
            )),
            UserRepository::new(empty_db()),
        );

        let outcome = service
            .apply_action(
                &Principal::new(1),
                ActionInput {
                    target_id: 3,
                    action: FollowAction::Unfollow,
                    is_request: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.kind, ActionKind::Resent);
        assert_eq!(outcome.status, Some(FollowStatus::Pending));
        assert_eq!(outcome.message, "Follow request sent again");
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_succeeds() {
        let service = FollowActionService::new(
            FollowRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_exec_results([exec_result(0), exec_result(0)])
                    .into_connection(),
            )),
            UserRepository::new(empty_db()),
        );

        let outcome = service
            .apply_action(
                &Principal::new(1),
                ActionInput {
                    target_id: 2,
                    action: FollowAction::Unfollow,
                    is_request: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.kind, ActionKind::Unfollowed);
        assert!(outcome.success);
        assert_eq!(outcome.message, "Unfollowed / Request cancelled");
    }

    #[tokio::test]
    async fn test_unknown_target_is_user_not_found() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec_result(0)]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service
            .apply_action(&Principal::new(1), follow_input(99, None))
            .await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }
}
