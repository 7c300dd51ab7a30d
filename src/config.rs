//! Planner configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::point::Priority;

/// Rank table used to order priority bands; lower rank is visited first.
///
/// Treated as an opaque total order by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRanks {
    ranks: HashMap<Priority, u32>,
}

impl Default for PriorityRanks {
    fn default() -> Self {
        Self::new([
            (Priority::High, 1),
            (Priority::Normal, 2),
            (Priority::Low, 3),
        ])
    }
}

impl PriorityRanks {
    pub fn new(ranks: impl IntoIterator<Item = (Priority, u32)>) -> Self {
        Self {
            ranks: ranks.into_iter().collect(),
        }
    }

    /// Rank for a priority. Unranked priorities sort after every ranked one.
    pub fn rank(&self, priority: Priority) -> u32 {
        self.ranks.get(&priority).copied().unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Debounce window applied to point mutations before auto-recompute.
    pub debounce_ms: u64,
    /// Upper bound on waypoints per provider request.
    pub max_waypoints: usize,
    pub ranks: PriorityRanks,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            max_waypoints: 25,
            ranks: PriorityRanks::default(),
        }
    }
}

impl PlannerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
