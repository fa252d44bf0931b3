//! Data models
//!
//! Shared between the menu editor and the backend API.
//! Server ids are `i64`; session-only entities carry a [`TempId`].

pub mod category;
pub mod dish;
pub mod id;
pub mod restaurant;

// Re-exports
pub use category::*;
pub use dish::*;
pub use id::*;
pub use restaurant::*;
