//! In-process backend
//!
//! Keeps restaurants, categories and dishes in memory with the same
//! constraints the REST API enforces: unique slugs, dishes must reference an
//! existing category, a category cannot be deleted while dishes remain.
//! Failures can be injected per entity to exercise partial commits.

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use shared::models::{
    Category, Dish, EntityId, MenuCategory, Restaurant, RestaurantMenu, RestaurantUpdate,
};
use shared::slug::SlugAvailability;
use shared::staged::ActionKind;
use shared::util::now_millis;
use std::collections::HashMap;
use std::time::Duration;

use super::{EntityKind, MenuBackend, SlugRegistry};
use crate::error::PersistError;

/// One call received by the backend, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub kind: EntityKind,
    pub action: ActionKind,
    /// Id as sent (temporary for creates)
    pub id: EntityId,
    /// Parent category as sent, for dishes
    pub category_id: Option<EntityId>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    restaurants: IndexMap<i64, Restaurant>,
    categories: IndexMap<i64, Category>,
    dishes: IndexMap<i64, Dish>,
    /// Injected failures, consumed on first matching call
    failures: HashMap<(EntityKind, EntityId), PersistError>,
    calls: Vec<BackendCall>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn take_failure(&mut self, kind: EntityKind, id: EntityId) -> Result<(), PersistError> {
        match self.failures.remove(&(kind, id)) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn slug_owner(&self, slug: &str) -> Option<&Restaurant> {
        self.restaurants.values().find(|r| r.slug == slug)
    }

    fn has_category(&self, id: EntityId) -> bool {
        id.persisted()
            .is_some_and(|id| self.categories.contains_key(&id))
    }
}

/// In-memory [`MenuBackend`]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every persistence call (used to observe in-flight commits)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    // ========== Seeding ==========

    /// Insert a restaurant as-is
    pub fn insert_restaurant(&self, restaurant: Restaurant) -> Restaurant {
        let mut state = self.state.lock();
        state.next_id = state.next_id.max(restaurant.id);
        state.restaurants.insert(restaurant.id, restaurant.clone());
        restaurant
    }

    /// Insert a committed category at the end of the menu
    pub fn insert_category(&self, restaurant_id: i64, name: &str) -> Category {
        let mut state = self.state.lock();
        let id = state.allocate_id();
        let category = Category {
            id: EntityId::Persisted(id),
            name: name.to_string(),
            restaurant_id,
            position: None,
        };
        state.categories.insert(id, category.clone());
        category
    }

    /// Insert a committed dish at the end of its category
    pub fn insert_dish(&self, mut dish: Dish) -> Dish {
        let mut state = self.state.lock();
        let id = state.allocate_id();
        dish.id = EntityId::Persisted(id);
        state.dishes.insert(id, dish.clone());
        dish
    }

    // ========== Inspection ==========

    /// Fail the next call for `(kind, id)` with `err`
    pub fn fail_on(&self, kind: EntityKind, id: EntityId, err: PersistError) {
        self.state.lock().failures.insert((kind, id), err);
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    pub fn category(&self, id: i64) -> Option<Category> {
        self.state.lock().categories.get(&id).cloned()
    }

    pub fn dish(&self, id: i64) -> Option<Dish> {
        self.state.lock().dishes.get(&id).cloned()
    }

    pub fn dishes(&self) -> Vec<Dish> {
        self.state.lock().dishes.values().cloned().collect()
    }

    pub fn restaurant(&self, id: i64) -> Option<Restaurant> {
        self.state.lock().restaurants.get(&id).cloned()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn record(&self, kind: EntityKind, action: ActionKind, id: EntityId, category_id: Option<EntityId>) {
        self.state.lock().calls.push(BackendCall {
            kind,
            action,
            id,
            category_id,
        });
    }
}

#[async_trait]
impl SlugRegistry for MemoryBackend {
    async fn check_slug_availability(
        &self,
        candidate: &str,
        user_id: &str,
    ) -> Result<SlugAvailability, PersistError> {
        let state = self.state.lock();
        Ok(match state.slug_owner(candidate) {
            Some(owner) => SlugAvailability {
                exists: true,
                owned_by_requester: owner.user_id == user_id,
            },
            None => SlugAvailability::default(),
        })
    }
}

#[async_trait]
impl MenuBackend for MemoryBackend {
    async fn load_menu(&self, restaurant_id: i64) -> Result<RestaurantMenu, PersistError> {
        let state = self.state.lock();
        let restaurant = state
            .restaurants
            .get(&restaurant_id)
            .cloned()
            .ok_or_else(|| PersistError::NotFound(format!("restaurant {restaurant_id}")))?;

        let categories = state
            .categories
            .values()
            .filter(|c| c.restaurant_id == restaurant_id)
            .map(|c| MenuCategory {
                category: c.clone(),
                dishes: state
                    .dishes
                    .values()
                    .filter(|d| d.category_id == c.id)
                    .cloned()
                    .collect(),
            })
            .collect();

        Ok(RestaurantMenu {
            restaurant,
            categories,
        })
    }

    async fn persist_restaurant(
        &self,
        update: &RestaurantUpdate,
    ) -> Result<Restaurant, PersistError> {
        self.simulate_latency().await;
        let id = EntityId::Persisted(update.id);
        self.record(EntityKind::Restaurant, ActionKind::Update, id, None);

        let mut state = self.state.lock();
        state.take_failure(EntityKind::Restaurant, id)?;

        if let Some(slug) = &update.slug
            && let Some(owner) = state.slug_owner(slug)
            && owner.id != update.id
        {
            return Err(PersistError::conflict("slug", format!("slug '{slug}' already exists")));
        }

        let restaurant = state
            .restaurants
            .get_mut(&update.id)
            .ok_or_else(|| PersistError::NotFound(format!("restaurant {}", update.id)))?;
        restaurant.apply(update);
        restaurant.updated_at = Some(now_millis());
        Ok(restaurant.clone())
    }

    async fn persist_category(
        &self,
        action: ActionKind,
        category: &Category,
    ) -> Result<Category, PersistError> {
        self.simulate_latency().await;
        self.record(EntityKind::Category, action, category.id, None);

        let mut state = self.state.lock();
        state.take_failure(EntityKind::Category, category.id)?;

        match action {
            ActionKind::Create => {
                let id = state.allocate_id();
                let saved = Category {
                    id: EntityId::Persisted(id),
                    ..category.clone()
                };
                state.categories.insert(id, saved.clone());
                Ok(saved)
            }
            ActionKind::Update => {
                let id = persisted(category.id)?;
                let slot = state
                    .categories
                    .get_mut(&id)
                    .ok_or_else(|| PersistError::NotFound(format!("category {id}")))?;
                *slot = category.clone();
                Ok(slot.clone())
            }
            ActionKind::Delete => {
                let id = persisted(category.id)?;
                if state.dishes.values().any(|d| d.category_id == category.id) {
                    return Err(PersistError::Validation(format!(
                        "category {id} still has dishes"
                    )));
                }
                Ok(state
                    .categories
                    .shift_remove(&id)
                    .unwrap_or_else(|| category.clone()))
            }
        }
    }

    async fn persist_dish(&self, action: ActionKind, dish: &Dish) -> Result<Dish, PersistError> {
        self.simulate_latency().await;
        self.record(EntityKind::Dish, action, dish.id, Some(dish.category_id));

        let mut state = self.state.lock();
        state.take_failure(EntityKind::Dish, dish.id)?;

        if action != ActionKind::Delete && !state.has_category(dish.category_id) {
            return Err(PersistError::Validation(format!(
                "dish references unknown category {}",
                dish.category_id
            )));
        }

        match action {
            ActionKind::Create => {
                let id = state.allocate_id();
                let saved = Dish {
                    id: EntityId::Persisted(id),
                    ..dish.clone()
                };
                state.dishes.insert(id, saved.clone());
                Ok(saved)
            }
            ActionKind::Update => {
                let id = persisted(dish.id)?;
                let slot = state
                    .dishes
                    .get_mut(&id)
                    .ok_or_else(|| PersistError::NotFound(format!("dish {id}")))?;
                *slot = dish.clone();
                Ok(slot.clone())
            }
            ActionKind::Delete => {
                let id = persisted(dish.id)?;
                Ok(state.dishes.shift_remove(&id).unwrap_or_else(|| dish.clone()))
            }
        }
    }
}

fn persisted(id: EntityId) -> Result<i64, PersistError> {
    id.persisted()
        .ok_or_else(|| PersistError::Validation(format!("{id} has no server id yet")))
}
