//! Edit session
//!
//! One [`EditSession`] per editing session for one restaurant. It owns the
//! staging cache, rejects overlapping commits and publishes a revision
//! counter that bumps on every change so views can re-render.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use shared::error::AppResult;
use shared::models::{Category, Dish, EntityId, MenuCategory, Restaurant, RestaurantMenu, RestaurantUpdate};
use shared::slug::SlugStatus;
use shared::staged::ActionKind;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::backend::MenuBackend;
use crate::commit::{CommitCoordinator, CommitReport};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::slug::SlugAllocator;
use crate::staging::{StageOutcome, StagingCache};

/// Clears the commit flag when the commit future completes or is dropped
struct CommitGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CommitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct EditSession {
    cache: Mutex<StagingCache>,
    backend: Arc<dyn MenuBackend>,
    config: EditorConfig,
    committing: AtomicBool,
    revision: watch::Sender<u64>,
}

impl EditSession {
    pub fn new(backend: Arc<dyn MenuBackend>, config: EditorConfig) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            cache: Mutex::new(StagingCache::new()),
            backend,
            config,
            committing: AtomicBool::new(false),
            revision,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn MenuBackend> {
        &self.backend
    }

    // ========== Loading ==========

    /// Fetch the menu from the backend and start editing it
    pub async fn load(&self, restaurant_id: i64) -> EditorResult<()> {
        let menu = self.backend.load_menu(restaurant_id).await?;
        self.load_restaurant(menu);
        Ok(())
    }

    /// Start editing `menu`; pending edits are dropped
    pub fn load_restaurant(&self, menu: RestaurantMenu) {
        self.cache.lock().load_restaurant(menu);
        self.bump();
    }

    // ========== Staging ==========

    pub fn stage_category(
        &self,
        id: EntityId,
        action: ActionKind,
        payload: Category,
    ) -> AppResult<StageOutcome> {
        let outcome = self.cache.lock().stage_category(id, action, payload)?;
        self.bump();
        Ok(outcome)
    }

    pub fn stage_dish(&self, id: EntityId, action: ActionKind, payload: Dish) -> AppResult<StageOutcome> {
        let outcome = self.cache.lock().stage_dish(id, action, payload)?;
        self.bump();
        Ok(outcome)
    }

    pub fn update_restaurant(&self, update: RestaurantUpdate) -> AppResult<()> {
        self.cache.lock().update_restaurant(update)?;
        self.bump();
        Ok(())
    }

    /// Drop pending edits, keep the loaded menu
    pub fn discard(&self) {
        self.cache.lock().discard();
        self.bump();
    }

    /// Forget everything, including the loaded menu
    pub fn clear(&self) {
        self.cache.lock().clear();
        self.bump();
    }

    // ========== Reading ==========

    pub fn merged_menu(&self) -> Vec<MenuCategory> {
        self.cache.lock().merged_menu()
    }

    /// Working restaurant, staged edits included
    pub fn restaurant(&self) -> Option<Restaurant> {
        self.cache.lock().restaurant().cloned()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.cache.lock().has_unsaved_changes()
    }

    pub fn is_committing(&self) -> bool {
        self.committing.load(Ordering::Acquire)
    }

    /// Run `f` against the cache; keep it short, staging blocks meanwhile
    pub fn with_cache<R>(&self, f: impl FnOnce(&StagingCache) -> R) -> R {
        f(&*self.cache.lock())
    }

    /// Revision counter, bumped on every change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    // ========== Commit ==========

    pub async fn commit(&self) -> EditorResult<CommitReport> {
        self.commit_with_cancel(CancellationToken::new()).await
    }

    /// Commit, stopping before the next call once `cancel` fires
    ///
    /// A second commit while one is running fails with
    /// [`EditorError::CommitInProgress`]; it is never queued.
    pub async fn commit_with_cancel(&self, cancel: CancellationToken) -> EditorResult<CommitReport> {
        let _guard = CommitGuard::acquire(&self.committing).ok_or(EditorError::CommitInProgress)?;
        if !self.cache.lock().is_loaded() {
            return Err(EditorError::NotLoaded);
        }

        let report = CommitCoordinator::new(&self.cache, &*self.backend)
            .with_cancellation(cancel)
            .with_revision(&self.revision)
            .run()
            .await;
        Ok(report)
    }

    // ========== Slugs ==========

    fn slug_owner(&self) -> EditorResult<(i64, String, Option<String>)> {
        let cache = self.cache.lock();
        let restaurant = cache.restaurant().ok_or(EditorError::NotLoaded)?;
        let committed_slug = cache
            .baseline()
            .filter(|b| b.restaurant.id == restaurant.id)
            .map(|b| b.restaurant.slug.clone());
        Ok((restaurant.id, restaurant.user_id.clone(), committed_slug))
    }

    /// Availability of `candidate` for the restaurant's owner
    pub async fn check_slug(&self, candidate: &str) -> EditorResult<SlugStatus> {
        let (_, user_id, _) = self.slug_owner()?;
        let allocator = SlugAllocator::new(&*self.backend, self.config.slug_style);
        Ok(allocator.check(candidate, &user_id).await?)
    }

    /// Derive an unused slug from `name` and stage it on the restaurant
    ///
    /// The restaurant's own committed slug counts as free for it.
    pub async fn assign_slug(&self, name: &str) -> EditorResult<String> {
        let (restaurant_id, user_id, committed_slug) = self.slug_owner()?;
        let allocator = SlugAllocator::new(&*self.backend, self.config.slug_style);

        let base = allocator.normalize(name);
        let slug = if committed_slug.as_deref() == Some(base.as_str()) {
            base
        } else {
            allocator.allocate(name, &user_id).await?
        };

        self.update_restaurant(RestaurantUpdate::new(restaurant_id).with_slug(slug.clone()))?;
        Ok(slug)
    }

    /// Re-derive the slug after a commit reported a slug conflict
    pub async fn resolve_slug_conflict(&self, name: &str) -> EditorResult<String> {
        let (restaurant_id, user_id, _) = self.slug_owner()?;
        let conflicted = self
            .restaurant()
            .map(|r| r.slug)
            .ok_or(EditorError::NotLoaded)?;

        let allocator = SlugAllocator::new(&*self.backend, self.config.slug_style);
        let slug = allocator.allocate_after(name, &user_id, &conflicted).await?;
        tracing::info!(restaurant_id, conflicted = %conflicted, slug = %slug, "Slug re-allocated after conflict");

        self.update_restaurant(RestaurantUpdate::new(restaurant_id).with_slug(slug.clone()))?;
        Ok(slug)
    }
}
