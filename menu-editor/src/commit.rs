//! Commit Coordinator
//!
//! Drains the staging overlays through a [`MenuBackend`] in dependency order:
//!
//! 1. restaurant update
//! 2. category creates (builds the [`IdRemap`])
//! 3. category updates
//! 4. dish creates, parents remapped
//! 5. dish updates, parents remapped
//! 6. dish deletes
//! 7. category deletes
//!
//! The plan is captured under the cache lock; the lock is released for every
//! backend call and re-taken to settle the result, so staging and projection
//! keep working while a commit is in flight. Nothing is retried here.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use shared::models::{Category, Dish, EntityId, Restaurant, RestaurantUpdate};
use shared::staged::{ActionKind, StagedAction};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::backend::{EntityKind, MenuBackend};
use crate::error::PersistError;
use crate::staging::StagingCache;

// ========== Id remapping ==========

/// Temporary id → server id, filled as category creates succeed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdRemap {
    ids: HashMap<EntityId, EntityId>,
}

impl IdRemap {
    pub fn insert(&mut self, temp: EntityId, server: EntityId) {
        self.ids.insert(temp, server);
    }

    pub fn get(&self, temp: &EntityId) -> Option<EntityId> {
        self.ids.get(temp).copied()
    }

    /// Server id for `id` if it was remapped, `id` itself otherwise
    pub fn resolve(&self, id: EntityId) -> EntityId {
        self.get(&id).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ========== Report ==========

/// Result of one entity's commit
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    /// Persisted; `server_id` is the id the entity now has
    Committed { server_id: EntityId },
    /// Target vanished server-side; entry dropped, snapshot should be refreshed
    NotFound,
    /// Backend rejected the call; entry retained
    Failed(PersistError),
    /// Not sent because `on` failed first; entry retained
    Blocked { on: EntityId },
    /// Not sent because the commit was cancelled; entry retained
    Skipped,
}

impl OutcomeStatus {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    /// Whether the overlay entry is still there for a later commit
    pub fn is_retained(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Blocked { .. } | Self::Skipped)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Committed { server_id } => write!(f, "committed as {server_id}"),
            Self::NotFound => write!(f, "not found"),
            Self::Failed(err) => write!(f, "failed: {err}"),
            Self::Blocked { on } => write!(f, "blocked on {on}"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// One line of the commit report
#[derive(Debug, Clone, PartialEq)]
pub struct EntityOutcome {
    pub kind: EntityKind,
    pub action: ActionKind,
    /// Id as staged (temporary for creates)
    pub id: EntityId,
    pub status: OutcomeStatus,
}

/// Per-entity results of one commit pass, in drain order
#[derive(Debug, Clone, Default)]
pub struct CommitReport {
    pub outcomes: Vec<EntityOutcome>,
    /// Temporary ids resolved during this pass
    pub remap: IdRemap,
    pub cancelled: bool,
}

impl CommitReport {
    /// Every staged entry reached the server
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_committed())
    }

    pub fn committed(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_committed())
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_committed())
    }

    /// Uniqueness conflicts with the offending field; re-derive and commit again
    pub fn conflicts(&self) -> impl Iterator<Item = (&EntityOutcome, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            OutcomeStatus::Failed(err) => err.conflict_field().map(|field| (o, field)),
            _ => None,
        })
    }

    /// Some target vanished server-side; the caller should reload the menu
    pub fn needs_refresh(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status == OutcomeStatus::NotFound)
    }

    /// Outcome for a staged id
    pub fn outcome(&self, id: &EntityId) -> Option<&EntityOutcome> {
        self.outcomes.iter().find(|o| &o.id == id)
    }

    fn push(&mut self, kind: EntityKind, action: ActionKind, id: EntityId, status: OutcomeStatus) {
        self.outcomes.push(EntityOutcome {
            kind,
            action,
            id,
            status,
        });
    }
}

// ========== Plan ==========

/// Snapshot of everything to send, grouped in drain order
#[derive(Debug, Clone, Default)]
pub struct CommitPlan {
    pub restaurant: Option<Restaurant>,
    pub category_creates: Vec<Category>,
    pub category_updates: Vec<Category>,
    pub dish_creates: Vec<Dish>,
    pub dish_updates: Vec<Dish>,
    pub dish_deletes: Vec<Dish>,
    pub category_deletes: Vec<Category>,
}

impl CommitPlan {
    pub fn capture(cache: &StagingCache) -> Self {
        let mut plan = Self {
            restaurant: cache
                .restaurant()
                .filter(|_| cache.restaurant_changed())
                .cloned(),
            ..Self::default()
        };

        for (_, action) in cache.categories().iter() {
            match action {
                StagedAction::Create(c) => plan.category_creates.push(c.clone()),
                StagedAction::Update(c) => plan.category_updates.push(c.clone()),
                StagedAction::Delete(c) => plan.category_deletes.push(c.clone()),
            }
        }
        for (_, action) in cache.dishes().iter() {
            match action {
                StagedAction::Create(d) => plan.dish_creates.push(d.clone()),
                StagedAction::Update(d) => plan.dish_updates.push(d.clone()),
                StagedAction::Delete(d) => plan.dish_deletes.push(d.clone()),
            }
        }
        plan
    }

    pub fn len(&self) -> usize {
        usize::from(self.restaurant.is_some())
            + self.category_creates.len()
            + self.category_updates.len()
            + self.dish_creates.len()
            + self.dish_updates.len()
            + self.dish_deletes.len()
            + self.category_deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ========== Coordinator ==========

/// One commit pass over a session's cache
pub struct CommitCoordinator<'a, B: MenuBackend + ?Sized> {
    cache: &'a Mutex<StagingCache>,
    backend: &'a B,
    cancel: CancellationToken,
    revision: Option<&'a watch::Sender<u64>>,
}

impl<'a, B: MenuBackend + ?Sized> CommitCoordinator<'a, B> {
    pub fn new(cache: &'a Mutex<StagingCache>, backend: &'a B) -> Self {
        Self {
            cache,
            backend,
            cancel: CancellationToken::new(),
            revision: None,
        }
    }

    /// Stop issuing calls once `cancel` fires; in-flight calls complete
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Bump `revision` whenever a result is settled into the cache
    pub fn with_revision(mut self, revision: &'a watch::Sender<u64>) -> Self {
        self.revision = Some(revision);
        self
    }

    pub async fn run(self) -> CommitReport {
        let plan = CommitPlan::capture(&self.cache.lock());
        let mut report = CommitReport::default();
        if plan.is_empty() {
            tracing::debug!("Nothing staged, commit skipped");
            return report;
        }

        tracing::info!(
            restaurant = plan.restaurant.is_some(),
            category_creates = plan.category_creates.len(),
            category_updates = plan.category_updates.len(),
            dish_creates = plan.dish_creates.len(),
            dish_updates = plan.dish_updates.len(),
            dish_deletes = plan.dish_deletes.len(),
            category_deletes = plan.category_deletes.len(),
            "Commit started"
        );

        if let Some(sent) = plan.restaurant {
            self.commit_restaurant(sent, &mut report).await;
        }

        for sent in plan.category_creates {
            self.commit_category(ActionKind::Create, sent, &mut report).await;
        }
        for sent in plan.category_updates {
            self.commit_category(ActionKind::Update, sent, &mut report).await;
        }
        for sent in plan.dish_creates {
            self.commit_dish(ActionKind::Create, sent, &mut report).await;
        }
        for sent in plan.dish_updates {
            self.commit_dish(ActionKind::Update, sent, &mut report).await;
        }

        // category -> dish whose delete did not go through
        let mut undeleted: HashMap<EntityId, EntityId> = HashMap::new();
        for sent in plan.dish_deletes {
            let (id, category_id) = (sent.id, sent.category_id);
            if !self.commit_dish(ActionKind::Delete, sent, &mut report).await {
                undeleted.entry(category_id).or_insert(id);
            }
        }
        for sent in plan.category_deletes {
            if let Some(&dish_id) = undeleted.get(&sent.id) {
                self.block(&mut report, EntityKind::Category, ActionKind::Delete, sent.id, dish_id);
                continue;
            }
            self.commit_category(ActionKind::Delete, sent, &mut report).await;
        }

        let failed = report.failures().count();
        if failed == 0 {
            tracing::info!(committed = report.outcomes.len(), "Commit complete");
        } else {
            tracing::info!(
                committed = report.outcomes.len() - failed,
                failed,
                cancelled = report.cancelled,
                "Commit finished with failures"
            );
        }
        report
    }

    /// Record a skip if cancellation fired; returns true when skipped
    fn skip_if_cancelled(
        &self,
        report: &mut CommitReport,
        kind: EntityKind,
        action: ActionKind,
        id: EntityId,
    ) -> bool {
        if !self.cancel.is_cancelled() {
            return false;
        }
        if !report.cancelled {
            tracing::info!("Commit cancelled, remaining entries skipped");
            report.cancelled = true;
        }
        report.push(kind, action, id, OutcomeStatus::Skipped);
        true
    }

    fn block(
        &self,
        report: &mut CommitReport,
        kind: EntityKind,
        action: ActionKind,
        id: EntityId,
        on: EntityId,
    ) {
        if self.skip_if_cancelled(report, kind, action, id) {
            return;
        }
        tracing::warn!(%kind, %action, %id, %on, "Commit blocked by earlier failure");
        report.push(kind, action, id, OutcomeStatus::Blocked { on });
    }

    fn notify(&self) {
        if let Some(revision) = self.revision {
            revision.send_modify(|r| *r += 1);
        }
    }

    fn record_failure(
        &self,
        report: &mut CommitReport,
        kind: EntityKind,
        action: ActionKind,
        id: EntityId,
        err: PersistError,
    ) {
        tracing::warn!(%kind, %action, %id, error = %err, retryable = err.is_retryable(), "Commit failed");
        report.push(kind, action, id, OutcomeStatus::Failed(err));
    }

    async fn commit_restaurant(&self, sent: Restaurant, report: &mut CommitReport) {
        let id = EntityId::Persisted(sent.id);
        if self.skip_if_cancelled(report, EntityKind::Restaurant, ActionKind::Update, id) {
            return;
        }

        let update = RestaurantUpdate::from_restaurant(&sent);
        match self.backend.persist_restaurant(&update).await {
            Ok(saved) => {
                self.cache.lock().settle_restaurant(&sent, saved);
                self.notify();
                report.push(
                    EntityKind::Restaurant,
                    ActionKind::Update,
                    id,
                    OutcomeStatus::Committed { server_id: id },
                );
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!(restaurant_id = sent.id, "Restaurant vanished, staged edit dropped");
                self.cache.lock().forget_restaurant();
                self.notify();
                report.push(EntityKind::Restaurant, ActionKind::Update, id, OutcomeStatus::NotFound);
            }
            Err(err) => {
                self.record_failure(report, EntityKind::Restaurant, ActionKind::Update, id, err);
            }
        }
    }

    async fn commit_category(&self, action: ActionKind, sent: Category, report: &mut CommitReport) {
        let id = sent.id;
        if self.skip_if_cancelled(report, EntityKind::Category, action, id) {
            return;
        }

        match self.backend.persist_category(action, &sent).await {
            Ok(saved) => {
                let server_id = if action == ActionKind::Create {
                    report.remap.insert(id, saved.id);
                    saved.id
                } else {
                    id
                };
                self.cache.lock().settle_category(action, &sent, saved);
                self.notify();
                report.push(EntityKind::Category, action, id, OutcomeStatus::Committed { server_id });
            }
            Err(err) if err.is_not_found() && action != ActionKind::Create => {
                tracing::warn!(category_id = %id, %action, "Category vanished, staged edit dropped");
                self.cache.lock().forget_category(id);
                self.notify();
                report.push(EntityKind::Category, action, id, OutcomeStatus::NotFound);
            }
            Err(err) => self.record_failure(report, EntityKind::Category, action, id, err),
        }
    }

    /// Returns whether the dish reached the server
    async fn commit_dish(&self, action: ActionKind, mut sent: Dish, report: &mut CommitReport) -> bool {
        let id = sent.id;
        // the overlay copy was remapped when the parent settled; keep them equal
        let parent = report.remap.resolve(sent.category_id);
        if parent.is_temp() && action != ActionKind::Delete {
            self.block(report, EntityKind::Dish, action, id, sent.category_id);
            return false;
        }
        sent.category_id = parent;
        if self.skip_if_cancelled(report, EntityKind::Dish, action, id) {
            return false;
        }

        match self.backend.persist_dish(action, &sent).await {
            Ok(saved) => {
                let server_id = saved.id;
                self.cache.lock().settle_dish(action, &sent, saved);
                self.notify();
                report.push(EntityKind::Dish, action, id, OutcomeStatus::Committed { server_id });
                true
            }
            Err(err) if err.is_not_found() && action != ActionKind::Create => {
                tracing::warn!(dish_id = %id, %action, "Dish vanished, staged edit dropped");
                self.cache.lock().forget_dish(id);
                self.notify();
                report.push(EntityKind::Dish, action, id, OutcomeStatus::NotFound);
                // nothing left under the parent for this dish
                action == ActionKind::Delete
            }
            Err(err) => {
                self.record_failure(report, EntityKind::Dish, action, id, err);
                false
            }
        }
    }
}
