//! Staged actions
//!
//! An edit recorded against one entity while a menu editing session is open.
//! Unlike a plain CRUD call, every variant carries the full payload so the
//! merged view can render it and the commit can send it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of staged action, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action-tagged payload
///
/// ```json
/// { "type": "update", "data": { "id": 3, "name": "Antipasti", ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StagedAction<T> {
    Create(T),
    Update(T),
    Delete(T),
}

impl<T> StagedAction<T> {
    pub fn new(kind: ActionKind, payload: T) -> Self {
        match kind {
            ActionKind::Create => Self::Create(payload),
            ActionKind::Update => Self::Update(payload),
            ActionKind::Delete => Self::Delete(payload),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Create(_) => ActionKind::Create,
            Self::Update(_) => ActionKind::Update,
            Self::Delete(_) => ActionKind::Delete,
        }
    }

    pub fn payload(&self) -> &T {
        match self {
            Self::Create(p) | Self::Update(p) | Self::Delete(p) => p,
        }
    }

    pub fn payload_mut(&mut self) -> &mut T {
        match self {
            Self::Create(p) | Self::Update(p) | Self::Delete(p) => p,
        }
    }
}
