//! Core business logic for circle.
//!
//! The follow-relationship engine: actions on edges, approval of pending
//! requests, and the read-only graph projections.

pub mod services;

pub use services::*;
