//! Entity identity
//!
//! Server rows are keyed by `i64` (snowflake ids from the backend). Entities
//! created inside an editing session have no server row yet and carry a
//! client-generated [`TempId`] until the commit hands back the real id.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const TEMP_PREFIX: &str = "tmp:";

/// Client-generated identity for an entity that only exists in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(Uuid);

impl TempId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TempId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", TEMP_PREFIX, self.0)
    }
}

/// Identity of a category or dish
///
/// Serialized as a bare number for persisted ids and as `"tmp:<uuid>"` for
/// temporary ones, so a temporary id can never be mistaken for a row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    Persisted(i64),
    Temp(TempId),
}

impl EntityId {
    /// Fresh temporary id for a new entity
    pub fn temp() -> Self {
        Self::Temp(TempId::new())
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, Self::Temp(_))
    }

    /// Server id, if the entity has been committed
    pub fn persisted(&self) -> Option<i64> {
        match self {
            Self::Persisted(id) => Some(*id),
            Self::Temp(_) => None,
        }
    }

    pub fn as_temp(&self) -> Option<TempId> {
        match self {
            Self::Temp(id) => Some(*id),
            Self::Persisted(_) => None,
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self::Persisted(id)
    }
}

impl From<TempId> for EntityId {
    fn from(id: TempId) -> Self {
        Self::Temp(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persisted(id) => write!(f, "{}", id),
            Self::Temp(id) => write!(f, "{}", id),
        }
    }
}

/// Error parsing an [`EntityId`] from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity id: {0}")]
pub struct InvalidEntityId(pub String);

impl FromStr for EntityId {
    type Err = InvalidEntityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(TEMP_PREFIX) {
            return Uuid::parse_str(rest)
                .map(|uuid| Self::Temp(TempId(uuid)))
                .map_err(|_| InvalidEntityId(s.to_string()));
        }
        s.parse::<i64>()
            .map(Self::Persisted)
            .map_err(|_| InvalidEntityId(s.to_string()))
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Persisted(id) => serializer.serialize_i64(*id),
            Self::Temp(id) => serializer.collect_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(id) => Ok(Self::Persisted(id)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}
