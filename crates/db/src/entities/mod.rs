//! Database entities.

pub mod follow;
pub mod user;

pub use follow::Entity as Follow;
pub use user::Entity as User;
