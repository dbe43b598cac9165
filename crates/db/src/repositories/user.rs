//! User repository.

use std::sync::Arc;

use crate::entities::{
    User,
    user::{self, UserSummary},
};
use circle_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Check whether a user exists.
    pub async fn exists(&self, id: i64) -> AppResult<bool> {
        let count = User::find_by_id(id)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// List every user except `exclude_id` (paginated, by id).
    pub async fn find_others(
        &self,
        exclude_id: i64,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<UserSummary>> {
        User::find()
            .select_only()
            .column(user::Column::Id)
            .column_as(user::Column::Name, "username")
            .column(user::Column::ProfilePic)
            .filter(user::Column::Id.ne(exclude_id))
            .order_by_asc(user::Column::Id)
            .limit(limit)
            .offset(offset)
            .into_model::<UserSummary>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
