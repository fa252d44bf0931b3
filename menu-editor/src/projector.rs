//! Merged menu view
//!
//! Pure function of the server snapshot and the two overlays:
//! - baseline order is kept, deleted entries are hidden
//! - staged updates replace the baseline row in place
//! - created entries are appended in staging order
//! - a dish moved to another category is appended there
//! - dishes of a deleted category disappear with it unless moved away

use std::collections::HashSet;

use shared::models::{Category, Dish, EntityId, MenuCategory, RestaurantMenu};
use shared::staged::StagedAction;

use crate::staging::Overlay;

pub fn project(
    baseline: &RestaurantMenu,
    categories: &Overlay<Category>,
    dishes: &Overlay<Dish>,
) -> Vec<MenuCategory> {
    let mut placed: HashSet<EntityId> = HashSet::new();
    let mut merged: Vec<MenuCategory> = Vec::with_capacity(baseline.categories.len());

    for entry in &baseline.categories {
        let category = match categories.get(&entry.id()) {
            Some(StagedAction::Delete(_)) => continue,
            Some(action) => action.payload().clone(),
            None => entry.category.clone(),
        };

        let mut shown = Vec::with_capacity(entry.dishes.len());
        for dish in &entry.dishes {
            let dish = match dishes.get(&dish.id) {
                Some(StagedAction::Delete(_)) => continue,
                Some(action) if action.payload().category_id == entry.id() => action.payload(),
                Some(_) => continue,
                None => dish,
            };
            placed.insert(dish.id);
            shown.push(dish.clone());
        }

        merged.push(MenuCategory {
            category,
            dishes: shown,
        });
    }

    for (_, action) in categories.iter() {
        if let StagedAction::Create(category) = action {
            merged.push(MenuCategory::new(category.clone()));
        }
    }

    for (id, action) in dishes.iter() {
        let dish = match action {
            StagedAction::Create(dish) => dish,
            StagedAction::Update(dish) if !placed.contains(id) => dish,
            _ => continue,
        };
        if let Some(target) = merged.iter_mut().find(|c| c.id() == dish.category_id) {
            target.dishes.push(dish.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::Restaurant;

    fn category(id: EntityId, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            restaurant_id: 1,
            position: None,
        }
    }

    fn dish(id: EntityId, category_id: EntityId, title: &str) -> Dish {
        Dish {
            id,
            title: title.to_string(),
            price: Decimal::new(5, 0),
            description: None,
            image_url: None,
            category_id,
            position: None,
        }
    }

    fn baseline() -> RestaurantMenu {
        let mut menu = RestaurantMenu::new(Restaurant {
            id: 1,
            name: "Bistro".to_string(),
            logo_url: None,
            slug: "bistro".to_string(),
            user_id: "u1".to_string(),
            created_at: None,
            updated_at: None,
        });
        let starters = EntityId::Persisted(1);
        let mains = EntityId::Persisted(2);
        menu.categories = vec![
            MenuCategory {
                category: category(starters, "Starters"),
                dishes: vec![
                    dish(EntityId::Persisted(10), starters, "Soup"),
                    dish(EntityId::Persisted(11), starters, "Salad"),
                ],
            },
            MenuCategory {
                category: category(mains, "Mains"),
                dishes: vec![dish(EntityId::Persisted(20), mains, "Steak")],
            },
        ];
        menu
    }

    fn titles(category: &MenuCategory) -> Vec<&str> {
        category.dishes.iter().map(|d| d.title.as_str()).collect()
    }

    #[test]
    fn test_empty_overlays_reproduce_baseline() {
        let menu = baseline();
        let merged = project(&menu, &Overlay::default(), &Overlay::default());
        assert_eq!(merged, menu.categories);
    }

    #[test]
    fn test_updates_in_place_and_creates_appended() {
        let menu = baseline();
        let starters = EntityId::Persisted(1);
        let mut categories = Overlay::default();
        let mut dishes = Overlay::default();

        let desserts = EntityId::temp();
        categories.put(desserts, StagedAction::Create(category(desserts, "Desserts")));
        categories.put(starters, StagedAction::Update(category(starters, "Small plates")));

        let soup = EntityId::Persisted(10);
        dishes.put(soup, StagedAction::Update(dish(soup, starters, "Onion soup")));
        let bread = EntityId::temp();
        dishes.put(bread, StagedAction::Create(dish(bread, starters, "Bread")));
        let cake = EntityId::temp();
        dishes.put(cake, StagedAction::Create(dish(cake, desserts, "Cake")));

        let merged = project(&menu, &categories, &dishes);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].category.name, "Small plates");
        assert_eq!(titles(&merged[0]), vec!["Onion soup", "Salad", "Bread"]);
        assert_eq!(merged[2].category.name, "Desserts");
        assert_eq!(titles(&merged[2]), vec!["Cake"]);
    }

    #[test]
    fn test_deletes_hidden() {
        let menu = baseline();
        let mut categories = Overlay::default();
        let mut dishes = Overlay::default();

        let mains = EntityId::Persisted(2);
        categories.put(mains, StagedAction::Delete(category(mains, "Mains")));
        let salad = EntityId::Persisted(11);
        dishes.put(salad, StagedAction::Delete(dish(salad, EntityId::Persisted(1), "Salad")));

        let merged = project(&menu, &categories, &dishes);
        assert_eq!(merged.len(), 1);
        assert_eq!(titles(&merged[0]), vec!["Soup"]);
    }

    #[test]
    fn test_moved_dish_appears_under_new_category() {
        let menu = baseline();
        let mains = EntityId::Persisted(2);
        let mut dishes = Overlay::default();
        let soup = EntityId::Persisted(10);
        dishes.put(soup, StagedAction::Update(dish(soup, mains, "Soup")));

        let merged = project(&menu, &Overlay::default(), &dishes);
        assert_eq!(titles(&merged[0]), vec!["Salad"]);
        assert_eq!(titles(&merged[1]), vec!["Steak", "Soup"]);
    }

    #[test]
    fn test_dish_moved_out_of_deleted_category_survives() {
        let menu = baseline();
        let starters = EntityId::Persisted(1);
        let mains = EntityId::Persisted(2);
        let mut categories = Overlay::default();
        categories.put(starters, StagedAction::Delete(category(starters, "Starters")));
        let mut dishes = Overlay::default();
        let salad = EntityId::Persisted(11);
        dishes.put(salad, StagedAction::Update(dish(salad, mains, "Salad")));

        let merged = project(&menu, &categories, &dishes);
        assert_eq!(merged.len(), 1);
        assert_eq!(titles(&merged[0]), vec!["Steak", "Salad"]);
    }
}
