//! Shared types for the menu editor
//!
//! Domain models, staged actions, slug normalization and the error
//! envelope used on both sides of the backend boundary.

pub mod error;
pub mod models;
pub mod slug;
pub mod staged;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{Category, Dish, EntityId, MenuCategory, Restaurant, RestaurantMenu, RestaurantUpdate, TempId};
pub use slug::{SlugAvailability, SlugStatus, SlugStyle, slugify};
pub use staged::{ActionKind, StagedAction};
