//! Persistence boundary
//!
//! The editor never writes storage itself. Every committed change goes
//! through a [`MenuBackend`]: [`HttpBackend`] talks to the REST API,
//! [`MemoryBackend`] keeps everything in process (offline sessions, demos,
//! tests).

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::{BackendCall, MemoryBackend};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{Category, Dish, Restaurant, RestaurantMenu, RestaurantUpdate};
use shared::slug::SlugAvailability;
use shared::staged::ActionKind;
use std::fmt;

use crate::error::PersistError;

/// Which kind of entity a call or outcome refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Restaurant,
    Category,
    Dish,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Restaurant => "restaurant",
            EntityKind::Category => "category",
            EntityKind::Dish => "dish",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Slug existence check, the only query the slug allocator needs
#[async_trait]
pub trait SlugRegistry: Send + Sync {
    /// Whether `candidate` is used by any restaurant, and by whom.
    /// Pure lookup: nothing is reserved.
    async fn check_slug_availability(
        &self,
        candidate: &str,
        user_id: &str,
    ) -> Result<SlugAvailability, PersistError>;
}

/// Everything the editor needs from the backend
///
/// `update` and `delete` must be idempotent: deleting a missing row is a
/// success. Constraint violations come back as structured errors, never as
/// silent defaults.
#[async_trait]
pub trait MenuBackend: SlugRegistry {
    /// Server truth for one restaurant
    async fn load_menu(&self, restaurant_id: i64) -> Result<RestaurantMenu, PersistError>;

    async fn persist_restaurant(&self, update: &RestaurantUpdate)
    -> Result<Restaurant, PersistError>;

    /// `create` returns the category with its server-assigned id
    async fn persist_category(
        &self,
        action: ActionKind,
        category: &Category,
    ) -> Result<Category, PersistError>;

    /// `create` returns the dish with its server-assigned id
    async fn persist_dish(&self, action: ActionKind, dish: &Dish) -> Result<Dish, PersistError>;
}
