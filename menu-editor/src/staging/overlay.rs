//! Action-tagged overlay keyed by entity id

use indexmap::IndexMap;
use shared::models::EntityId;
use shared::staged::{ActionKind, StagedAction};

/// What staging an action did to the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// No previous entry for the id
    Inserted,
    /// A previous entry was replaced (last writer wins)
    Replaced { previous: ActionKind },
    /// `delete` after `create`: the entity never existed, entry removed
    Collapsed,
    /// `update` after `create`: still a create, payload replaced
    CreateAmended,
}

/// At most one staged action per id, in staging order
#[derive(Debug, Clone)]
pub struct Overlay<T> {
    entries: IndexMap<EntityId, StagedAction<T>>,
}

impl<T> Default for Overlay<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T> Overlay<T> {
    pub fn get(&self, id: &EntityId) -> Option<&StagedAction<T>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &StagedAction<T>)> {
        self.entries.iter()
    }

    /// Latest action kind staged for `id`
    pub fn kind_of(&self, id: &EntityId) -> Option<ActionKind> {
        self.entries.get(id).map(StagedAction::kind)
    }

    /// Apply the merge rule for a new action on `id`
    pub(crate) fn stage(&mut self, id: EntityId, action: StagedAction<T>) -> StageOutcome {
        let previous = self.kind_of(&id);
        match (previous, action) {
            (Some(ActionKind::Create), StagedAction::Delete(_)) => {
                self.entries.shift_remove(&id);
                StageOutcome::Collapsed
            }
            (Some(ActionKind::Create), StagedAction::Update(payload)) => {
                self.entries.insert(id, StagedAction::Create(payload));
                StageOutcome::CreateAmended
            }
            (previous, action) => {
                self.entries.insert(id, action);
                match previous {
                    Some(previous) => StageOutcome::Replaced { previous },
                    None => StageOutcome::Inserted,
                }
            }
        }
    }

    /// Insert or replace without the merge rule
    pub(crate) fn put(&mut self, id: EntityId, action: StagedAction<T>) {
        self.entries.insert(id, action);
    }

    pub(crate) fn remove(&mut self, id: &EntityId) -> Option<StagedAction<T>> {
        self.entries.shift_remove(id)
    }

    /// Move the entry for `from` to `to`, keeping its position
    pub(crate) fn rekey(&mut self, from: &EntityId, to: EntityId) {
        if let Some(index) = self.entries.get_index_of(from) {
            if let Some((_, action)) = self.entries.shift_remove_index(index) {
                self.entries.shift_insert(index, to, action);
            }
        }
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut StagedAction<T>> {
        self.entries.values_mut()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: PartialEq> Overlay<T> {
    /// Remove the entry only if it still equals `expected`
    ///
    /// Returns the current entry when it was re-staged in the meantime.
    pub(crate) fn remove_if_unchanged(
        &mut self,
        id: &EntityId,
        expected: &StagedAction<T>,
    ) -> Option<&StagedAction<T>> {
        if self.entries.get(id) == Some(expected) {
            self.entries.shift_remove(id);
            return None;
        }
        self.entries.get(id)
    }
}
