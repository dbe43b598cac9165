//! Follow entity (directed relationship edges between users).
//!
//! A pending edge is the follow request itself; there is no separate request table.

use sea_orm::FromQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    /// Awaiting the target's decision.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Active follow relationship.
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Declined by the target; the source may request again.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The user who follows or requests
    pub user_id: i64,

    /// The user being followed
    pub target_id: i64,

    pub status: FollowStatus,

    /// Time of the last status transition, not of the first insert
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Source,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TargetId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Target,
}

impl ActiveModelBehavior for ActiveModel {}

/// An incoming pending edge joined with the requester's summary profile.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct PendingRequest {
    /// Edge id, used to approve or reject.
    pub id: i64,
    #[serde(rename = "requesterId")]
    pub requester_id: i64,
    pub username: String,
    pub profile_pic: Option<String>,
    #[serde(rename = "requestedAt")]
    pub requested_at: DateTimeWithTimeZone,
}
