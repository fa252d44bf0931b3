//! Restaurant Model

use serde::{Deserialize, Serialize};

use super::category::MenuCategory;

/// Restaurant entity (one per editing session)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub logo_url: Option<String>,
    /// Public URL segment, unique across all restaurants
    pub slug: String,
    /// Owning user
    pub user_id: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Restaurant {
    /// Shallow-merge the fields present in `update`
    pub fn apply(&mut self, update: &RestaurantUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(logo_url) = &update.logo_url {
            self.logo_url = logo_url.clone();
        }
        if let Some(slug) = &update.slug {
            self.slug = slug.clone();
        }
        if let Some(user_id) = &update.user_id {
            self.user_id = user_id.clone();
        }
    }
}

/// Partial restaurant update
///
/// `logo_url` is doubly optional: `Some(None)` clears the logo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantUpdate {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl RestaurantUpdate {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_logo_url(mut self, logo_url: Option<String>) -> Self {
        self.logo_url = Some(logo_url);
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Full update carrying every field of `restaurant`
    pub fn from_restaurant(restaurant: &Restaurant) -> Self {
        Self {
            id: restaurant.id,
            name: Some(restaurant.name.clone()),
            logo_url: Some(restaurant.logo_url.clone()),
            slug: Some(restaurant.slug.clone()),
            user_id: Some(restaurant.user_id.clone()),
        }
    }

    /// Build a whole restaurant, when every required field is present
    pub fn into_restaurant(self) -> Option<Restaurant> {
        Some(Restaurant {
            id: self.id,
            name: self.name?,
            logo_url: self.logo_url.flatten(),
            slug: self.slug?,
            user_id: self.user_id?,
            created_at: None,
            updated_at: None,
        })
    }
}

/// Server truth for one restaurant: metadata plus the ordered menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantMenu {
    pub restaurant: Restaurant,
    #[serde(default)]
    pub categories: Vec<MenuCategory>,
}

impl RestaurantMenu {
    pub fn new(restaurant: Restaurant) -> Self {
        Self {
            restaurant,
            categories: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Restaurant {
        Restaurant {
            id: 1,
            name: "Trattoria".to_string(),
            logo_url: Some("logo.png".to_string()),
            slug: "trattoria".to_string(),
            user_id: "user-1".to_string(),
            created_at: Some(1),
            updated_at: Some(1),
        }
    }

    #[test]
    fn test_apply_merges_present_fields_only() {
        let mut restaurant = sample();
        restaurant.apply(&RestaurantUpdate::new(1).with_name("Osteria"));
        assert_eq!(restaurant.name, "Osteria");
        assert_eq!(restaurant.slug, "trattoria");
        assert_eq!(restaurant.logo_url.as_deref(), Some("logo.png"));
    }

    #[test]
    fn test_apply_can_clear_logo() {
        let mut restaurant = sample();
        restaurant.apply(&RestaurantUpdate::new(1).with_logo_url(None));
        assert!(restaurant.logo_url.is_none());
    }

    #[test]
    fn test_into_restaurant_requires_fields() {
        assert!(RestaurantUpdate::new(2).with_name("x").into_restaurant().is_none());

        let full = RestaurantUpdate::new(2)
            .with_name("Bistro")
            .with_slug("bistro")
            .with_user_id("user-2")
            .into_restaurant()
            .unwrap();
        assert_eq!(full.id, 2);
        assert!(full.logo_url.is_none());
    }

    #[test]
    fn test_partial_update_skips_absent_fields() {
        let json = serde_json::to_string(&RestaurantUpdate::new(3).with_slug("x")).unwrap();
        assert_eq!(json, r#"{"id":3,"slug":"x"}"#);
    }
}
