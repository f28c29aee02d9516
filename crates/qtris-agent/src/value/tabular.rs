use std::collections::HashMap;

use qtris_engine::Action;
use serde::{Deserialize, Serialize};

use crate::{action_values::ActionValues, state::StateKey};

use super::ValueFunction;

/// One row of action values per visited state.
///
/// Rows are created lazily with all values at zero. Serialized as a list of
/// entries because structured keys cannot be JSON object keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TableRepr", into = "TableRepr")]
pub struct TabularValues {
    table: HashMap<StateKey, ActionValues>,
}

#[derive(Serialize, Deserialize)]
struct TableRepr {
    entries: Vec<TableEntry>,
}

#[derive(Serialize, Deserialize)]
struct TableEntry {
    state: StateKey,
    values: ActionValues,
}

impl From<TableRepr> for TabularValues {
    fn from(repr: TableRepr) -> Self {
        let table = repr
            .entries
            .into_iter()
            .map(|entry| (entry.state, entry.values))
            .collect();
        Self { table }
    }
}

impl From<TabularValues> for TableRepr {
    fn from(values: TabularValues) -> Self {
        let entries = values
            .table
            .into_iter()
            .map(|(state, values)| TableEntry { state, values })
            .collect();
        Self { entries }
    }
}

impl TabularValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&StateKey, &ActionValues)> {
        self.table.iter()
    }
}

impl ValueFunction for TabularValues {
    fn predict(&self, state: &StateKey) -> ActionValues {
        self.table.get(state).copied().unwrap_or_default()
    }

    fn update(&mut self, state: &StateKey, action: Action, target: f64, learning_rate: f64) {
        let values = self.table.entry(state.clone()).or_default();
        values[action] += learning_rate * (target - values[action]);
    }

    fn visit(&mut self, state: &StateKey) {
        self.table.entry(state.clone()).or_default();
    }

    fn len(&self) -> usize {
        self.table.len()
    }
}
