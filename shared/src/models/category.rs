//! Category Model

use serde::{Deserialize, Serialize};

use super::dish::Dish;
use super::id::EntityId;

/// Category entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    pub restaurant_id: i64,
    /// Display position, plain field data (reordering is an ordinary update)
    #[serde(default)]
    pub position: Option<i32>,
}

impl Category {
    /// New category with a temporary id
    pub fn draft(restaurant_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::temp(),
            name: name.into(),
            restaurant_id,
            position: None,
        }
    }
}

/// A category together with its ordered dishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    #[serde(flatten)]
    pub category: Category,
    #[serde(default)]
    pub dishes: Vec<Dish>,
}

impl MenuCategory {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            dishes: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.category.id
    }
}
