//! StagingCache - pending menu edits over the loaded server snapshot

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Category, Dish, EntityId, MenuCategory, Restaurant, RestaurantMenu, RestaurantUpdate};
use shared::staged::{ActionKind, StagedAction};

use super::overlay::{Overlay, StageOutcome};
use crate::projector;
use crate::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_URL_LEN, validate_optional_text, validate_price,
    validate_required_text, validate_slug,
};

/// Session-scoped staging state
///
/// Holds the server truth (`baseline`), the working restaurant and one
/// overlay per entity kind. Nothing here touches the network.
#[derive(Debug, Clone, Default)]
pub struct StagingCache {
    baseline: Option<RestaurantMenu>,
    restaurant: Option<Restaurant>,
    categories: Overlay<Category>,
    dishes: Overlay<Dish>,
}

impl StagingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server snapshot; pending edits are dropped
    pub fn load_restaurant(&mut self, menu: RestaurantMenu) {
        tracing::debug!(
            restaurant_id = menu.restaurant.id,
            categories = menu.categories.len(),
            "Menu loaded into staging cache"
        );
        self.restaurant = Some(menu.restaurant.clone());
        self.baseline = Some(menu);
        self.categories.clear();
        self.dishes.clear();
    }

    pub fn is_loaded(&self) -> bool {
        self.baseline.is_some()
    }

    /// Server truth as last loaded or committed
    pub fn baseline(&self) -> Option<&RestaurantMenu> {
        self.baseline.as_ref()
    }

    /// Working restaurant (server truth plus staged edits)
    pub fn restaurant(&self) -> Option<&Restaurant> {
        self.restaurant.as_ref()
    }

    pub fn categories(&self) -> &Overlay<Category> {
        &self.categories
    }

    pub fn dishes(&self) -> &Overlay<Dish> {
        &self.dishes
    }

    /// Working restaurant differs from server truth
    pub fn restaurant_changed(&self) -> bool {
        match (&self.restaurant, &self.baseline) {
            (Some(working), Some(baseline)) => working != &baseline.restaurant,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.categories.is_empty() || !self.dishes.is_empty() || self.restaurant_changed()
    }

    /// Categories and dishes as the UI should render them
    pub fn merged_menu(&self) -> Vec<MenuCategory> {
        match &self.baseline {
            Some(baseline) => projector::project(baseline, &self.categories, &self.dishes),
            None => Vec::new(),
        }
    }

    // ========== Staging ==========

    /// Record a category action; on error the cache is unchanged
    ///
    /// Deleting a category also stages deletes for the dishes it currently
    /// shows (dropping any that were only staged for create).
    pub fn stage_category(
        &mut self,
        id: EntityId,
        action: ActionKind,
        payload: Category,
    ) -> AppResult<StageOutcome> {
        let baseline = self.loaded()?;
        let known = find_category(baseline, id).is_some();
        check_identity("category", id, action, payload.id, self.categories.kind_of(&id), known)?;

        if action != ActionKind::Delete {
            validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
            let restaurant_id = self.restaurant.as_ref().map_or(baseline.restaurant.id, |r| r.id);
            if payload.restaurant_id != restaurant_id {
                return Err(AppError::validation(format!(
                    "category belongs to restaurant {}, editing {}",
                    payload.restaurant_id, restaurant_id
                ))
                .with_detail("field", "restaurant_id"));
            }
        }

        let cascade: Vec<Dish> = if action == ActionKind::Delete {
            self.merged_menu()
                .into_iter()
                .find(|c| c.id() == id)
                .map(|c| c.dishes)
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let outcome = self.categories.stage(id, StagedAction::new(action, payload));
        for dish in cascade {
            self.dishes.stage(dish.id, StagedAction::Delete(dish));
        }

        tracing::debug!(category_id = %id, action = %action, ?outcome, "Category staged");
        Ok(outcome)
    }

    /// Record a dish action; on error the cache is unchanged
    pub fn stage_dish(
        &mut self,
        id: EntityId,
        action: ActionKind,
        payload: Dish,
    ) -> AppResult<StageOutcome> {
        let baseline = self.loaded()?;
        let known = find_dish(baseline, id).is_some();
        check_identity("dish", id, action, payload.id, self.dishes.kind_of(&id), known)?;

        if action != ActionKind::Delete {
            validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
            validate_price(payload.price)?;
            validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
            validate_optional_text(&payload.image_url, "image_url", MAX_URL_LEN)?;
            self.check_parent(payload.category_id)?;
        }

        let outcome = self.dishes.stage(id, StagedAction::new(action, payload));
        tracing::debug!(dish_id = %id, action = %action, ?outcome, "Dish staged");
        Ok(outcome)
    }

    /// Merge `update` into the working restaurant, or replace it when the id
    /// differs (switching editing context)
    pub fn update_restaurant(&mut self, update: RestaurantUpdate) -> AppResult<()> {
        if let Some(name) = &update.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
        }
        if let Some(slug) = &update.slug {
            validate_slug(slug)?;
        }
        if let Some(logo_url) = &update.logo_url {
            validate_optional_text(logo_url, "logo_url", MAX_URL_LEN)?;
        }

        match &mut self.restaurant {
            Some(restaurant) if restaurant.id == update.id => {
                restaurant.apply(&update);
            }
            _ => {
                let id = update.id;
                let replacement = update.into_restaurant().ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::RequiredField,
                        format!("restaurant {id} needs name, slug and user_id to replace the snapshot"),
                    )
                })?;
                tracing::debug!(restaurant_id = id, "Working restaurant replaced");
                self.restaurant = Some(replacement);
            }
        }
        Ok(())
    }

    /// Drop pending edits, keep the loaded snapshot
    pub fn discard(&mut self) {
        self.categories.clear();
        self.dishes.clear();
        self.restaurant = self.baseline.as_ref().map(|b| b.restaurant.clone());
    }

    /// Reset to the empty cache
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn loaded(&self) -> AppResult<&RestaurantMenu> {
        self.baseline
            .as_ref()
            .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotLoaded))
    }

    fn check_parent(&self, category_id: EntityId) -> AppResult<()> {
        match self.categories.kind_of(&category_id) {
            Some(ActionKind::Delete) => Err(AppError::with_message(
                ErrorCode::CategoryStagedForDelete,
                format!("category {category_id} is staged for deletion"),
            )
            .with_detail("field", "category_id")),
            Some(_) => Ok(()),
            None => {
                let baseline = self.loaded()?;
                if find_category(baseline, category_id).is_some() {
                    Ok(())
                } else {
                    Err(AppError::with_message(
                        ErrorCode::CategoryNotFound,
                        format!("category {category_id} not found"),
                    )
                    .with_detail("field", "category_id"))
                }
            }
        }
    }

    // ========== Reconciliation (commit) ==========

    pub(crate) fn settle_restaurant(&mut self, sent: &Restaurant, saved: Restaurant) {
        if self.restaurant.as_ref() == Some(sent) {
            self.restaurant = Some(saved.clone());
        }
        if let Some(baseline) = &mut self.baseline {
            baseline.restaurant = saved;
        }
    }

    pub(crate) fn settle_category(&mut self, action: ActionKind, sent: &Category, saved: Category) {
        let Some(baseline) = &mut self.baseline else {
            return;
        };

        match action {
            ActionKind::Create => {
                baseline.categories.push(MenuCategory::new(saved.clone()));
                settle_created(&mut self.categories, sent, sent.id, saved.id, |c, id| c.id = id);
                for action in self.dishes.values_mut() {
                    let dish = action.payload_mut();
                    if dish.category_id == sent.id {
                        dish.category_id = saved.id;
                    }
                }
            }
            ActionKind::Update => {
                if let Some(slot) = baseline.categories.iter_mut().find(|c| c.id() == saved.id) {
                    slot.category = saved;
                }
                self.categories
                    .remove_if_unchanged(&sent.id, &StagedAction::Update(sent.clone()));
            }
            ActionKind::Delete => {
                baseline.categories.retain(|c| c.id() != sent.id);
                self.categories
                    .remove_if_unchanged(&sent.id, &StagedAction::Delete(sent.clone()));
            }
        }
    }

    pub(crate) fn settle_dish(&mut self, action: ActionKind, sent: &Dish, saved: Dish) {
        let Some(baseline) = &mut self.baseline else {
            return;
        };

        match action {
            ActionKind::Create => {
                let server_id = saved.id;
                place_dish(baseline, saved, None);
                settle_created(&mut self.dishes, sent, sent.id, server_id, |d, id| d.id = id);
            }
            ActionKind::Update => {
                let slot = remove_dish(baseline, saved.id);
                place_dish(baseline, saved, slot);
                self.dishes
                    .remove_if_unchanged(&sent.id, &StagedAction::Update(sent.clone()));
            }
            ActionKind::Delete => {
                remove_dish(baseline, sent.id);
                self.dishes
                    .remove_if_unchanged(&sent.id, &StagedAction::Delete(sent.clone()));
            }
        }
    }

    /// Restaurant vanished server-side: the working copy falls back to the
    /// snapshot so the edit stops counting as unsaved
    pub(crate) fn forget_restaurant(&mut self) {
        self.restaurant = self.baseline.as_ref().map(|b| b.restaurant.clone());
    }

    /// Target vanished server-side: nothing left to retry
    pub(crate) fn forget_category(&mut self, id: EntityId) {
        if let Some(baseline) = &mut self.baseline {
            baseline.categories.retain(|c| c.id() != id);
        }
        self.categories.remove(&id);
    }

    /// Target vanished server-side: nothing left to retry
    pub(crate) fn forget_dish(&mut self, id: EntityId) {
        if let Some(baseline) = &mut self.baseline {
            remove_dish(baseline, id);
        }
        self.dishes.remove(&id);
    }
}

/// Identity rules shared by categories and dishes
fn check_identity(
    what: &str,
    id: EntityId,
    action: ActionKind,
    payload_id: EntityId,
    staged: Option<ActionKind>,
    known: bool,
) -> AppResult<()> {
    if payload_id != id {
        return Err(AppError::with_message(
            ErrorCode::IdMismatch,
            format!("{what} payload id {payload_id} does not match {id}"),
        ));
    }

    match (action, id) {
        (ActionKind::Create, EntityId::Persisted(_)) => Err(AppError::with_message(
            ErrorCode::InvalidTempId,
            format!("{what} {id} already has a server id; create needs a temporary id"),
        )),
        (ActionKind::Create, EntityId::Temp(_)) => Ok(()),
        (_, EntityId::Temp(_)) if staged != Some(ActionKind::Create) => {
            Err(AppError::with_message(
                ErrorCode::InvalidTempId,
                format!("{what} {id} was never staged for create"),
            ))
        }
        (_, EntityId::Persisted(_)) if !known && staged.is_none() => {
            let code = if what == "category" {
                ErrorCode::CategoryNotFound
            } else {
                ErrorCode::DishNotFound
            };
            Err(AppError::with_message(code, format!("{what} {id} not found")))
        }
        _ => Ok(()),
    }
}

/// Overlay entry after its create succeeded
///
/// Unchanged entries leave the overlay. An entry amended while the call was
/// in flight survives as an update of the new server id.
fn settle_created<T: Clone + PartialEq>(
    overlay: &mut Overlay<T>,
    sent: &T,
    temp_id: EntityId,
    server_id: EntityId,
    set_id: impl Fn(&mut T, EntityId),
) {
    let current = match overlay.get(&temp_id) {
        Some(StagedAction::Create(current)) => current.clone(),
        // deleted while in flight; the row now exists server-side
        _ => return,
    };

    if &current == sent {
        overlay.remove(&temp_id);
        return;
    }

    let mut amended = current;
    set_id(&mut amended, server_id);
    overlay.rekey(&temp_id, server_id);
    overlay.put(server_id, StagedAction::Update(amended));
}

fn find_category(menu: &RestaurantMenu, id: EntityId) -> Option<&MenuCategory> {
    menu.categories.iter().find(|c| c.id() == id)
}

fn find_dish(menu: &RestaurantMenu, id: EntityId) -> Option<&Dish> {
    menu.categories
        .iter()
        .flat_map(|c| c.dishes.iter())
        .find(|d| d.id == id)
}

/// Remove a dish from the snapshot, returning where it was
fn remove_dish(menu: &mut RestaurantMenu, id: EntityId) -> Option<(EntityId, usize)> {
    for category in &mut menu.categories {
        if let Some(index) = category.dishes.iter().position(|d| d.id == id) {
            category.dishes.remove(index);
            return Some((category.id(), index));
        }
    }
    None
}

/// Put a dish back at its old slot if it stayed in the same category,
/// otherwise at the end of its category
fn place_dish(menu: &mut RestaurantMenu, dish: Dish, slot: Option<(EntityId, usize)>) {
    let Some(category) = menu.categories.iter_mut().find(|c| c.id() == dish.category_id) else {
        tracing::warn!(dish_id = %dish.id, category_id = %dish.category_id, "Committed dish has no parent in snapshot");
        return;
    };
    match slot {
        Some((previous, index)) if previous == dish.category_id && index <= category.dishes.len() => {
            category.dishes.insert(index, dish);
        }
        _ => category.dishes.push(dish),
    }
}
