//! Configuration of a training run.
//!
//! [`QtrisConfig`] is read from a JSON file where every field is optional and
//! falls back to its default. It is validated once, before any session or
//! agent is built, through [`QtrisConfig::validate`].
//!
//! ```json
//! {
//!   "board": { "width": 10, "height": 20 },
//!   "agent": {
//!     "learning_rate": 0.1,
//!     "discount": 0.9,
//!     "exploration": { "initial_rate": 1.0, "cooling_rate": 0.999 },
//!     "radar": { "width": 6, "depth": 3 },
//!     "backend": { "kind": "tabular", "hidden_units": 32 }
//!   },
//!   "reward": { "lines_cleared": 1.0, "game_over": 2.0, "bumpiness_mode": "increase" }
//! }
//! ```

use qtris_engine::BoardConfig;
use qtris_evaluator::RewardWeights;
use serde::{Deserialize, Serialize};

/// Narrowest board a piece can spawn on.
pub const MIN_BOARD_WIDTH: usize = 4;
/// Radar rows are `u64` bitmasks, so no board may be wider than this.
pub const MAX_BOARD_WIDTH: usize = 64;
/// Shortest board a vertical I-piece fits on.
pub const MIN_BOARD_HEIGHT: usize = 4;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("board width {width} is outside 4..=64")]
    BoardWidth { width: usize },
    #[display("board height {height} is below 4")]
    BoardHeight { height: usize },
    #[display("radar width {radar_width} exceeds board width {board_width}")]
    RadarTooWide {
        radar_width: usize,
        board_width: usize,
    },
    #[display("radar width and depth must be at least 1")]
    EmptyRadar,
    #[display("learning rate {_0} is outside (0, 1]")]
    LearningRate(#[error(not(source))] f64),
    #[display("discount {_0} is outside [0, 1]")]
    Discount(#[error(not(source))] f64),
    #[display("exploration rate {_0} is outside [0, 1]")]
    ExplorationRate(#[error(not(source))] f64),
    #[display("cooling rate {_0} is outside (0, 1)")]
    CoolingRate(#[error(not(source))] f64),
    #[display("regressor needs at least one hidden unit")]
    NoHiddenUnits,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QtrisConfig {
    pub board: BoardConfig,
    pub agent: AgentConfig,
    pub reward: RewardWeights,
}

impl QtrisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_board(&self.board)?;
        self.agent.validate(&self.board)
    }
}

fn validate_board(board: &BoardConfig) -> Result<(), ConfigError> {
    if !(MIN_BOARD_WIDTH..=MAX_BOARD_WIDTH).contains(&board.width) {
        return Err(ConfigError::BoardWidth { width: board.width });
    }
    if board.height < MIN_BOARD_HEIGHT {
        return Err(ConfigError::BoardHeight {
            height: board.height,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Step size `α` of the value update.
    pub learning_rate: f64,
    /// Weight `γ` of the next state's value in the update target.
    pub discount: f64,
    pub exploration: ExplorationConfig,
    pub radar: RadarConfig,
    pub backend: BackendConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount: 0.9,
            exploration: ExplorationConfig::default(),
            radar: RadarConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self, board: &BoardConfig) -> Result<(), ConfigError> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::LearningRate(self.learning_rate));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(ConfigError::Discount(self.discount));
        }
        let ExplorationConfig {
            initial_rate,
            cooling_rate,
        } = self.exploration;
        if !(0.0..=1.0).contains(&initial_rate) {
            return Err(ConfigError::ExplorationRate(initial_rate));
        }
        if !(cooling_rate > 0.0 && cooling_rate < 1.0) {
            return Err(ConfigError::CoolingRate(cooling_rate));
        }
        self.radar.validate(board)?;
        if self.backend.kind == BackendKind::Regressor && self.backend.hidden_units == 0 {
            return Err(ConfigError::NoHiddenUnits);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    pub initial_rate: f64,
    /// Factor applied to the rate after every exploratory pick, in `(0, 1)`.
    pub cooling_rate: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            initial_rate: 1.0,
            cooling_rate: 0.999,
        }
    }
}

/// Size of the board window below the falling piece that goes into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub width: usize,
    pub depth: usize,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self { width: 6, depth: 3 }
    }
}

impl RadarConfig {
    pub fn validate(&self, board: &BoardConfig) -> Result<(), ConfigError> {
        if self.width == 0 || self.depth == 0 {
            return Err(ConfigError::EmptyRadar);
        }
        if self.width > board.width || self.width > MAX_BOARD_WIDTH {
            return Err(ConfigError::RadarTooWide {
                radar_width: self.width,
                board_width: board.width,
            });
        }
        Ok(())
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    #[display("tabular")]
    Tabular,
    #[display("regressor")]
    Regressor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Hidden layer size; only used by the regressor.
    pub hidden_units: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Tabular,
            hidden_units: 32,
        }
    }
}
