//! Events published while tending the garden.

use crate::record::{MemoryRecord, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-triggered action an event or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GardenAction {
    Load,
    Plant,
    Water,
}

/// Lifecycle events emitted by the garden service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum GardenEvent {
    /// Records were fetched from the backend and replaced the local set.
    Loaded { count: usize, skipped: usize },
    /// A new memory was accepted by the backend.
    Planted { record: MemoryRecord },
    /// A memory was watered.
    Watered { id: RecordId, at: DateTime<Utc> },
    /// An action failed; `message` is what the user should see.
    Failed {
        action: GardenAction,
        message: String,
    },
}
