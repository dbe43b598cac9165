//! Database repositories.

pub mod follow;
pub mod user;

pub use follow::{EdgeFilter, FollowRepository};
pub use user::UserRepository;
