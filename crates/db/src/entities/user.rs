//! User entity.
//!
//! Only the columns the relationship graph reads are modelled here; credentials
//! and profile editing belong to other services.

use sea_orm::FromQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether following an account requires approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Followed immediately.
    #[sea_orm(string_value = "public")]
    Public,
    /// Follows start as pending requests.
    #[sea_orm(string_value = "private")]
    Private,
}

impl AccountType {
    /// Whether a follow toward this account should be sent as a request.
    #[must_use]
    pub const fn requires_approval(self) -> bool {
        matches!(self, Self::Private)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Display name
    pub name: String,

    #[sea_orm(unique)]
    pub email: String,

    pub account_type: AccountType,

    /// Profile picture reference
    #[sea_orm(nullable)]
    pub profile_pic: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Summary profile used by every graph listing.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub profile_pic: Option<String>,
}
