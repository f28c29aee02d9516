use std::ops::{Index, IndexMut};

use qtris_engine::Action;
use serde::{Deserialize, Serialize};

/// Estimated value of each action in one state, indexed in [`Action::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionValues([f64; Action::LEN]);

impl ActionValues {
    #[must_use]
    pub const fn new(values: [f64; Action::LEN]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn get(&self, action: Action) -> f64 {
        self.0[action.index()]
    }

    #[must_use]
    pub fn as_array(&self) -> &[f64; Action::LEN] {
        &self.0
    }

    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.get(self.best_action())
    }

    /// The highest-valued action; ties go to the earliest in [`Action::ALL`].
    #[must_use]
    pub fn best_action(&self) -> Action {
        let mut best = Action::ALL[0];
        for action in Action::ALL {
            if self.get(action) > self.get(best) {
                best = action;
            }
        }
        best
    }
}

impl Index<Action> for ActionValues {
    type Output = f64;

    fn index(&self, action: Action) -> &Self::Output {
        &self.0[action.index()]
    }
}

impl IndexMut<Action> for ActionValues {
    fn index_mut(&mut self, action: Action) -> &mut Self::Output {
        &mut self.0[action.index()]
    }
}
