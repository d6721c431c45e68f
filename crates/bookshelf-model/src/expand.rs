//! Per-session expand/collapse state.
//!
//! The state is a single default plus per-header overrides keyed by stable
//! row id, so it survives rebuilds of the same session unchanged and can be
//! persisted by the caller (the engine itself never does I/O). It is
//! discarded with the session: a new grouping means a new state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::node::RowId;

/// Expand/collapse flags for group headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandState {
    /// State for headers without an override.
    default_expanded: bool,
    /// Per-header overrides, keyed by stable header row id.
    overrides: HashMap<RowId, bool>,
}

impl ExpandState {
    /// All headers expanded (the usual initial state).
    pub fn all_expanded() -> Self {
        Self {
            default_expanded: true,
            overrides: HashMap::new(),
        }
    }

    /// All headers collapsed.
    pub fn all_collapsed() -> Self {
        Self {
            default_expanded: false,
            overrides: HashMap::new(),
        }
    }

    /// The state for a header: its override, or the default.
    pub fn is_expanded(&self, header: RowId) -> bool {
        self.overrides
            .get(&header)
            .copied()
            .unwrap_or(self.default_expanded)
    }

    /// Records a header's state. An override equal to the default is
    /// dropped to keep the map minimal.
    pub fn set(&mut self, header: RowId, expanded: bool) {
        if expanded == self.default_expanded {
            self.overrides.remove(&header);
        } else {
            self.overrides.insert(header, expanded);
        }
    }

    /// Sets every header uniformly, clearing all overrides.
    pub fn set_all(&mut self, expanded: bool) {
        self.default_expanded = expanded;
        self.overrides.clear();
    }

    /// Number of headers whose state differs from the default.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Default for ExpandState {
    fn default() -> Self {
        Self::all_expanded()
    }
}
