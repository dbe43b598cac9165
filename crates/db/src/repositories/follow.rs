//! Follow edge repository.
//!
//! Every mutation here is a single statement touching at most one row for a
//! given `(user_id, target_id)` pair. The unique index on that pair is the only
//! concurrency guard; callers never lock.

use std::sync::Arc;

use crate::entities::{
    Follow, follow,
    follow::{FollowStatus, PendingRequest},
    user::{self, UserSummary},
};
use circle_common::{AppError, AppResult};
use sea_orm::{
    ActiveEnum, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    sea_query::{Expr, OnConflict},
};

/// Predicate selecting the edges a status update applies to.
///
/// Unset fields do not constrain the match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeFilter {
    pub id: Option<i64>,
    pub source_id: Option<i64>,
    pub target_id: Option<i64>,
    pub status: Option<FollowStatus>,
}

impl EdgeFilter {
    /// Match the edge for an ordered pair.
    #[must_use]
    pub const fn pair(source_id: i64, target_id: i64) -> Self {
        Self {
            id: None,
            source_id: Some(source_id),
            target_id: Some(target_id),
            status: None,
        }
    }

    /// Match an edge by id.
    #[must_use]
    pub const fn edge(id: i64) -> Self {
        Self {
            id: Some(id),
            source_id: None,
            target_id: None,
            status: None,
        }
    }

    /// Additionally require the edge to point at `target_id`.
    #[must_use]
    pub const fn with_target(mut self, target_id: i64) -> Self {
        self.target_id = Some(target_id);
        self
    }

    /// Additionally require the edge's current status.
    #[must_use]
    pub const fn with_status(mut self, status: FollowStatus) -> Self {
        self.status = Some(status);
        self
    }

    const fn is_unscoped(&self) -> bool {
        self.id.is_none() && self.source_id.is_none() && self.target_id.is_none()
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(id) = self.id {
            condition = condition.add(follow::Column::Id.eq(id));
        }
        if let Some(source_id) = self.source_id {
            condition = condition.add(follow::Column::UserId.eq(source_id));
        }
        if let Some(target_id) = self.target_id {
            condition = condition.add(follow::Column::TargetId.eq(target_id));
        }
        if let Some(status) = self.status {
            condition = condition.add(follow::Column::Status.eq(status));
        }
        condition
    }
}

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an edge by ID.
    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<follow::Model>> {
        Follow::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the edge for an ordered pair.
    pub async fn get(&self, source_id: i64, target_id: i64) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::UserId.eq(source_id))
            .filter(follow::Column::TargetId.eq(target_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new edge unless one already exists for the pair.
    ///
    /// Returns `true` when a row was written. An existing row is left untouched
    /// and reported as `false`, never as an error.
    pub async fn upsert_new(
        &self,
        source_id: i64,
        target_id: i64,
        status: FollowStatus,
    ) -> AppResult<bool> {
        let model = follow::ActiveModel {
            user_id: Set(source_id),
            target_id: Set(target_id),
            status: Set(status),
            ..Default::default()
        };

        let rows_affected = Follow::insert(model)
            .on_conflict(
                OnConflict::columns([follow::Column::UserId, follow::Column::TargetId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows_affected > 0)
    }

    /// Set the status of every edge matching `filter` and refresh its timestamp.
    pub async fn update_status(&self, filter: EdgeFilter, status: FollowStatus) -> AppResult<u64> {
        if filter.is_unscoped() {
            return Err(AppError::Internal(
                "Refusing to update follow status without an edge or user scope".to_string(),
            ));
        }

        let result = Follow::update_many()
            .col_expr(follow::Column::Status, Expr::value(status.to_value()))
            .col_expr(follow::Column::CreatedAt, Expr::current_timestamp().into())
            .filter(filter.condition())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Move a rejected edge back to pending.
    pub async fn reactivate_rejected(&self, source_id: i64, target_id: i64) -> AppResult<u64> {
        self.update_status(
            EdgeFilter::pair(source_id, target_id).with_status(FollowStatus::Rejected),
            FollowStatus::Pending,
        )
        .await
    }

    /// Resolve a pending edge addressed to `target_id`.
    pub async fn decide_pending(
        &self,
        edge_id: i64,
        target_id: i64,
        status: FollowStatus,
    ) -> AppResult<u64> {
        self.update_status(
            EdgeFilter::edge(edge_id)
                .with_target(target_id)
                .with_status(FollowStatus::Pending),
            status,
        )
        .await
    }

    /// Delete the edge for an ordered pair, whatever its status.
    pub async fn delete(&self, source_id: i64, target_id: i64) -> AppResult<u64> {
        let result = Follow::delete_many()
            .filter(follow::Column::UserId.eq(source_id))
            .filter(follow::Column::TargetId.eq(target_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Get all outgoing edges of a user.
    pub async fn find_by_source(&self, source_id: i64) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .filter(follow::Column::UserId.eq(source_id))
            .order_by_asc(follow::Column::TargetId)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the targets of a user's edges with `status` (paginated, by user id).
    pub async fn find_targets(
        &self,
        source_id: i64,
        status: FollowStatus,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<UserSummary>> {
        Follow::find()
            .select_only()
            .column_as(user::Column::Id, "id")
            .column_as(user::Column::Name, "username")
            .column_as(user::Column::ProfilePic, "profile_pic")
            .join(JoinType::InnerJoin, follow::Relation::Target.def())
            .filter(follow::Column::UserId.eq(source_id))
            .filter(follow::Column::Status.eq(status))
            .order_by_asc(user::Column::Id)
            .limit(limit)
            .offset(offset)
            .into_model::<UserSummary>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the sources of edges toward a user with `status` (paginated, by user id).
    pub async fn find_sources(
        &self,
        target_id: i64,
        status: FollowStatus,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<UserSummary>> {
        Follow::find()
            .select_only()
            .column_as(user::Column::Id, "id")
            .column_as(user::Column::Name, "username")
            .column_as(user::Column::ProfilePic, "profile_pic")
            .join(JoinType::InnerJoin, follow::Relation::Source.def())
            .filter(follow::Column::TargetId.eq(target_id))
            .filter(follow::Column::Status.eq(status))
            .order_by_asc(user::Column::Id)
            .limit(limit)
            .offset(offset)
            .into_model::<UserSummary>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get pending requests addressed to a user, oldest first.
    pub async fn find_pending_incoming(&self, target_id: i64) -> AppResult<Vec<PendingRequest>> {
        Follow::find()
            .select_only()
            .column_as(follow::Column::Id, "id")
            .column_as(follow::Column::UserId, "requester_id")
            .column_as(user::Column::Name, "username")
            .column_as(user::Column::ProfilePic, "profile_pic")
            .column_as(follow::Column::CreatedAt, "requested_at")
            .join(JoinType::InnerJoin, follow::Relation::Source.def())
            .filter(follow::Column::TargetId.eq(target_id))
            .filter(follow::Column::Status.eq(FollowStatus::Pending))
            .order_by_asc(follow::Column::CreatedAt)
            .order_by_asc(follow::Column::Id)
            .into_model::<PendingRequest>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count edges toward a user with `status`.
    pub async fn count_sources(&self, target_id: i64, status: FollowStatus) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::TargetId.eq(target_id))
            .filter(follow::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's outgoing edges with `status`.
    pub async fn count_targets(&self, source_id: i64, status: FollowStatus) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::UserId.eq(source_id))
            .filter(follow::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_edge(id: i64, user_id: i64, target_id: i64, status: FollowStatus) -> follow::Model {
        follow::Model {
            id,
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

    #[tokio::test]
    async fn test_get_found() {
        let edge = create_test_edge(1, 10, 20, FollowStatus::Accepted);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge.clone()]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        let result = repo.get(10, 20).await.unwrap();

        assert_eq!(result, Some(edge));
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow::Model>::new()])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        let result = repo.get(10, 30).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upsert_new_inserted() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(1)])
                .into_connection(),
        );

        let repo = FollowRepository::new(db.clone());
        let inserted = repo
            .upsert_new(10, 20, FollowStatus::Accepted)
            .await
            .unwrap();

        assert!(inserted);

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("ON CONFLICT"));
        assert!(sql.contains("DO NOTHING"));
    }

    #[tokio::test]
    async fn test_upsert_new_conflict_is_not_an_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0)])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        let inserted = repo
            .upsert_new(10, 20, FollowStatus::Pending)
            .await
            .unwrap();

        assert!(!inserted);
    }

    #[tokio::test]
    async fn test_reactivate_rejected_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(1)])
                .into_connection(),
        );

        let repo = FollowRepository::new(db.clone());
        let rows = repo.reactivate_rejected(10, 20).await.unwrap();
        assert_eq!(rows, 1);

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("UPDATE"));
        assert!(sql.contains("rejected"));
    }

    #[tokio::test]
    async fn test_update_status_requires_scope() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = FollowRepository::new(db);
        let result = repo
            .update_status(
                EdgeFilter::default().with_status(FollowStatus::Pending),
                FollowStatus::Accepted,
            )
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_decide_pending_no_match() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0)])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        let rows = repo
            .decide_pending(5, 20, FollowStatus::Accepted)
            .await
            .unwrap();

        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_edge_reports_zero() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0)])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        let rows = repo.delete(10, 20).await.unwrap();

        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_find_targets_projects_users() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "id" => Value::BigInt(Some(2)),
                    "username" => Value::from("bob"),
                    "profile_pic" => Value::from(Some("bob.png".to_string())),
                }]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        let result = repo
            .find_targets(1, FollowStatus::Accepted, 3, 0)
            .await
            .unwrap();

        assert_eq!(
            result,
            vec![UserSummary {
                id: 2,
                username: "bob".to_string(),
                profile_pic: Some("bob.png".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_find_pending_incoming() {
        let requested_at = Utc::now().fixed_offset();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "id" => Value::BigInt(Some(7)),
                    "requester_id" => Value::BigInt(Some(1)),
                    "username" => Value::from("alice"),
                    "profile_pic" => Value::from(None::<String>),
                    "requested_at" => Value::from(requested_at),
                }]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        let result = repo.find_pending_incoming(3).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 7);
        assert_eq!(result[0].requester_id, 1);
        assert_eq!(result[0].username, "alice");
        assert!(result[0].profile_pic.is_none());
    }

    #[tokio::test]
    async fn test_count_sources() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(4))
                }]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        let count = repo
            .count_sources(2, FollowStatus::Accepted)
            .await
            .unwrap();

        assert_eq!(count, 4);
    }
}
