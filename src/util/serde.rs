//! Shared serializable identifiers and payload descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a live task.
pub type TaskId = u64;

/// Unique identifier for a pooled vehicle (its index in the pool).
pub type VehicleId = usize;

/// Identifier of a placement region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    /// Build a region id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Kind of payload a task carries. Decides which receivers are wired to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// A linked sub-entity picked up at the task site.
    Entity,
    /// A currency reward.
    Money,
}

/// What completing a task awards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Payload kinds, in the order receivers are wired.
    pub kinds: Vec<PayloadKind>,
    /// Currency granted when the task is claimed.
    #[serde(default)]
    pub reward: u32,
    /// Region experience granted when the task is claimed.
    #[serde(default)]
    pub experience: u32,
    /// Linked sub-entity, if any.
    #[serde(default)]
    pub entity: Option<String>,
    /// Name of the preset the task was generated from.
    #[serde(default)]
    pub preset: Option<String>,
}

impl TaskPayload {
    /// True if the payload carries the given kind.
    pub fn has_kind(&self, kind: PayloadKind) -> bool {
        self.kinds.contains(&kind)
    }
}
