//! Dish Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::EntityId;

/// Dish entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub id: EntityId,
    pub title: String,
    /// Price as decimal text (e.g. "12.50"), never a float
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Parent category (may be a temporary id while the category is staged)
    pub category_id: EntityId,
    #[serde(default)]
    pub position: Option<i32>,
}

impl Dish {
    /// New dish with a temporary id
    pub fn draft(category_id: EntityId, title: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: EntityId::temp(),
            title: title.into(),
            price,
            description: None,
            image_url: None,
            category_id,
            position: None,
        }
    }
}
