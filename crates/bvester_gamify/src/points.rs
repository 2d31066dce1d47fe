//! Action point values and award outcomes

use serde::Serialize;
use std::collections::HashMap;

use crate::levels::LevelProgress;

/// Point value table keyed by platform action name.
///
/// Unknown actions are worth 0, which the ledger treats as a no-op rather
/// than an error.
#[derive(Debug, Clone, Default)]
pub struct ActionPoints {
    values: HashMap<String, u64>,
}

impl ActionPoints {
    pub fn from_map(values: HashMap<String, u64>) -> Self {
        Self { values }
    }

    pub fn value_of(&self, action: &str) -> u64 {
        self.values.get(action).copied().unwrap_or(0)
    }

    pub fn set(&mut self, action: impl Into<String>, points: u64) {
        self.values.insert(action.into(), points);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.values.iter()
    }
}

/// Result of a successful point award.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardOutcome {
    pub points_awarded: u64,
    pub total_points: u64,
    pub level: u32,
    pub leveled_up: bool,
    pub next_level_progress: LevelProgress,
}
