//! Value-function backends.
//!
//! The agent only talks to a [`ValueFunction`]: it asks for the values of all
//! actions in a state and nudges one of them toward a target. Two backends
//! implement it:
//!
//! - [`TabularValues`] - One row of action values per distinct [`StateKey`]
//! - [`MlpRegressor`] - A one-hidden-layer network that generalizes across keys
//!
//! [`ValueModel`] picks one of them from configuration and is the form that
//! gets persisted.

use qtris_engine::Action;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    action_values::ActionValues,
    config::{AgentConfig, BackendKind},
    state::StateKey,
};

pub use self::{
    regressor::{FeatureLayout, MlpRegressor, ShapeError},
    tabular::TabularValues,
};

mod regressor;
mod tabular;

pub trait ValueFunction {
    /// Current value estimate of every action in `state`.
    #[must_use]
    fn predict(&self, state: &StateKey) -> ActionValues;

    /// Moves the estimate of `action` in `state` toward `target` by a step of
    /// size `learning_rate`.
    fn update(&mut self, state: &StateKey, action: Action, target: f64, learning_rate: f64);

    /// Records a first visit of `state`. Backends that store per-state rows
    /// create an all-zero row here.
    fn visit(&mut self, _state: &StateKey) {}

    /// Number of stored entries: table rows or network parameters.
    #[must_use]
    fn len(&self) -> usize;

    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueModel {
    Tabular(TabularValues),
    Regressor(MlpRegressor),
}

impl ValueModel {
    /// Builds an empty (or freshly initialized) backend of the configured kind.
    pub fn from_config<R>(config: &AgentConfig, board_height: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        match config.backend.kind {
            BackendKind::Tabular => Self::Tabular(TabularValues::new()),
            BackendKind::Regressor => {
                let layout = FeatureLayout::new(config.radar, board_height);
                Self::Regressor(MlpRegressor::new(layout, config.backend.hidden_units, rng))
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Tabular(_) => BackendKind::Tabular,
            Self::Regressor(_) => BackendKind::Regressor,
        }
    }

    fn as_dyn(&self) -> &dyn ValueFunction {
        match self {
            Self::Tabular(values) => values,
            Self::Regressor(values) => values,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn ValueFunction {
        match self {
            Self::Tabular(values) => values,
            Self::Regressor(values) => values,
        }
    }
}

impl ValueFunction for ValueModel {
    fn predict(&self, state: &StateKey) -> ActionValues {
        self.as_dyn().predict(state)
    }

    fn update(&mut self, state: &StateKey, action: Action, target: f64, learning_rate: f64) {
        self.as_dyn_mut()
            .update(state, action, target, learning_rate);
    }

    fn visit(&mut self, state: &StateKey) {
        self.as_dyn_mut().visit(state);
    }

    fn len(&self) -> usize {
        self.as_dyn().len()
    }
}
