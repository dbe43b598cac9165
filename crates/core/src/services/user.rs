//! User directory service.

use circle_common::AppResult;
use circle_db::{
    entities::user::UserSummary,
    repositories::UserRepository,
};

use crate::services::{identity::Principal, pagination::Pagination};

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// List every user except the caller, by id.
    pub async fn list_users(
        &self,
        principal: &Principal,
        page: Pagination,
    ) -> AppResult<Vec<UserSummary>> {
        self.user_repo
            .find_others(principal.user_id(), page.limit, page.offset())
            .await
    }
}
