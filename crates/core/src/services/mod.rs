//! Business logic services.

#![allow(missing_docs)]

pub mod follow_action;
pub mod follow_approval;
pub mod graph_query;
pub mod identity;
pub mod pagination;
pub mod user;

pub use follow_action::{ActionInput, ActionKind, ActionOutcome, FollowAction, FollowActionService};
pub use follow_approval::{Decision, DecisionOutcome, FollowApprovalService};
pub use graph_query::{GraphQueryService, RelationshipCounts, RelationshipSummary};
pub use identity::{Claims, IdentityService, Principal};
pub use pagination::Pagination;
pub use user::UserService;
