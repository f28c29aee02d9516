//! Reinforcement-learning agent that learns to play a [`GameSession`](qtris_engine::GameSession).
//!
//! The agent keeps an estimate of how good each [`Action`](qtris_engine::Action)
//! is in each state and improves it from the rewards computed by
//! [`qtris_evaluator`].
//!
//! # How Learning Works
//!
//! 1. **Encode** - [`StateEncoder`] compresses the session into a [`StateKey`]:
//!    the falling piece plus a small radar window of the board below it
//! 2. **Select** - [`Exploration`] decides between a random action and the
//!    best known one, cooling its rate after each random pick
//! 3. **Apply** - The session applies the action and moves the piece down
//! 4. **Reward** - The settled boards before and after are scored by a
//!    [`RewardEvaluator`](qtris_evaluator::RewardEvaluator)
//! 5. **Update** - The chosen action's value moves toward
//!    `reward + γ · max next value`
//!
//! # Architecture
//!
//! ```text
//! LearningAgent
//!     ↓ encodes with
//! StateEncoder → StateKey
//!     ↓ looked up in
//! ValueModel (TabularValues | MlpRegressor)
//!     ↓ persisted as
//! AgentSnapshot (JSON)
//! ```
//!
//! # Value Backends
//!
//! - **Tabular** - One row of four values per distinct state key. Exact, but
//!   only learns about states it has seen.
//! - **Regressor** - A small network over the key's features. Generalizes
//!   across keys at the cost of exactness.
//!
//! Both implement [`ValueFunction`] and are chosen by [`BackendConfig`].
//!
//! # Example
//!
//! ```
//! use qtris_agent::{AgentConfig, LearningAgent};
//! use qtris_engine::{BagSeed, BoardConfig, GameSession};
//! use qtris_evaluator::RewardEvaluator;
//!
//! let board = BoardConfig::default();
//! let mut agent = LearningAgent::with_seed(&AgentConfig::default(), &board, 42).unwrap();
//! let mut session = GameSession::with_seed(board, BagSeed::from_u128(42));
//! let evaluator = RewardEvaluator::default();
//!
//! let score = agent.run_episode(&mut session, &evaluator, 1000);
//! assert_eq!(agent.history(), &[score]);
//! ```

pub use self::{
    action_values::ActionValues,
    agent::{AgentStep, LearningAgent},
    config::{
        AgentConfig, BackendConfig, BackendKind, ConfigError, ExplorationConfig, QtrisConfig,
        RadarConfig,
    },
    exploration::Exploration,
    history::{DescriptiveStats, EpisodeScore, HistoryStats},
    persistence::{AgentSnapshot, FORMAT_VERSION, LoadError},
    state::{StateEncoder, StateKey},
    value::{FeatureLayout, MlpRegressor, ShapeError, TabularValues, ValueFunction, ValueModel},
};

pub mod action_values;
pub mod agent;
pub mod config;
pub mod exploration;
pub mod history;
pub mod persistence;
pub mod state;
pub mod value;
