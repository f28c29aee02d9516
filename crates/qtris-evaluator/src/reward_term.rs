//! Independent reward terms.
//!
//! Every term measures one non-negative magnitude from a [`Transition`] and
//! declares whether it rewards or penalizes the agent through its
//! [`RewardSignal`]. Terms know nothing about weights; the
//! [`RewardEvaluator`](crate::RewardEvaluator) combines them.
//!
//! | id | signal | magnitude |
//! |---|---|---|
//! | `lines_cleared` | + | 0, 1, 3, 5, 8 for 0..=4 lines (15 beyond) |
//! | `piece_depth` | + | mean row of the locked piece / (height - 1) |
//! | `new_holes` | - | holes created by the step |
//! | `bumpiness` | - | bumpiness increase, or absolute bumpiness after |
//! | `blocked_move` | - | 1 if the action was rejected |
//! | `game_over` | - | 1 if the step ended the game |

use std::fmt;

use qtris_engine::line_clear_score;
use serde::{Deserialize, Serialize};

use crate::transition::Transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardSignal {
    Positive,
    Negative,
}

impl RewardSignal {
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

/// How the bumpiness term measures the surface.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpinessMode {
    /// Only an increase over the previous board is penalized.
    #[default]
    Increase,
    /// The bumpiness of the resulting board is penalized as a whole.
    Absolute,
}

pub trait RewardTerm: fmt::Debug + Send + Sync {
    #[must_use]
    fn id(&self) -> &str;
    #[must_use]
    fn name(&self) -> &str;
    #[must_use]
    fn signal(&self) -> RewardSignal;
    #[must_use]
    fn clone_boxed(&self) -> BoxedRewardTerm;
    /// Non-negative magnitude of this term for `transition`.
    #[must_use]
    fn measure(&self, transition: &Transition) -> f64;
}

pub type BoxedRewardTerm = Box<dyn RewardTerm>;

impl Clone for BoxedRewardTerm {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

#[must_use]
pub fn all_reward_terms(bumpiness_mode: BumpinessMode) -> Vec<BoxedRewardTerm> {
    vec![
        Box::new(LinesCleared),
        Box::new(PieceDepth),
        Box::new(NewHoles),
        Box::new(Bumpiness {
            mode: bumpiness_mode,
        }),
        Box::new(BlockedMove),
        Box::new(GameOver),
    ]
}

#[expect(clippy::cast_precision_loss)]
fn as_f64(n: usize) -> f64 {
    n as f64
}

/// Lines cleared by the step, scaled super-linearly like the game score.
#[derive(Debug, Clone)]
pub struct LinesCleared;

impl RewardTerm for LinesCleared {
    fn id(&self) -> &'static str {
        "lines_cleared"
    }
    fn name(&self) -> &'static str {
        "Lines Cleared"
    }
    fn signal(&self) -> RewardSignal {
        RewardSignal::Positive
    }
    fn clone_boxed(&self) -> BoxedRewardTerm {
        Box::new(self.clone())
    }
    fn measure(&self, transition: &Transition) -> f64 {
        as_f64(line_clear_score(transition.cleared_lines())) / 100.0
    }
}

/// How low the locked piece came to rest, in `[0, 1]`.
///
/// Zero on steps where nothing locked.
#[derive(Debug, Clone)]
pub struct PieceDepth;

impl RewardTerm for PieceDepth {
    fn id(&self) -> &'static str {
        "piece_depth"
    }
    fn name(&self) -> &'static str {
        "Piece Depth"
    }
    fn signal(&self) -> RewardSignal {
        RewardSignal::Positive
    }
    fn clone_boxed(&self) -> BoxedRewardTerm {
        Box::new(self.clone())
    }
    fn measure(&self, transition: &Transition) -> f64 {
        let Some(piece) = transition.locked_piece() else {
            return 0.0;
        };
        let height = transition.after().board().height();
        if height < 2 {
            return 0.0;
        }
        let rows: f64 = piece.cells().iter().map(|p| f64::from(p.row)).sum();
        let mean_row = rows / 4.0;
        (mean_row / as_f64(height - 1)).clamp(0.0, 1.0)
    }
}

/// Holes created by the step; holes removed by line clears never count.
#[derive(Debug, Clone)]
pub struct NewHoles;

impl RewardTerm for NewHoles {
    fn id(&self) -> &'static str {
        "new_holes"
    }
    fn name(&self) -> &'static str {
        "New Holes"
    }
    fn signal(&self) -> RewardSignal {
        RewardSignal::Negative
    }
    fn clone_boxed(&self) -> BoxedRewardTerm {
        Box::new(self.clone())
    }
    fn measure(&self, transition: &Transition) -> f64 {
        let before = transition.before().num_holes();
        let after = transition.after().num_holes();
        as_f64(after.saturating_sub(before))
    }
}

#[derive(Debug, Clone)]
pub struct Bumpiness {
    pub mode: BumpinessMode,
}

impl RewardTerm for Bumpiness {
    fn id(&self) -> &'static str {
        "bumpiness"
    }
    fn name(&self) -> &'static str {
        "Surface Bumpiness"
    }
    fn signal(&self) -> RewardSignal {
        RewardSignal::Negative
    }
    fn clone_boxed(&self) -> BoxedRewardTerm {
        Box::new(self.clone())
    }
    fn measure(&self, transition: &Transition) -> f64 {
        let after = transition.after().surface_bumpiness();
        match self.mode {
            BumpinessMode::Increase => {
                as_f64(after.saturating_sub(transition.before().surface_bumpiness()))
            }
            BumpinessMode::Absolute => as_f64(after),
        }
    }
}

/// A lateral move or rotation rejected by collision.
#[derive(Debug, Clone)]
pub struct BlockedMove;

impl RewardTerm for BlockedMove {
    fn id(&self) -> &'static str {
        "blocked_move"
    }
    fn name(&self) -> &'static str {
        "Blocked Move"
    }
    fn signal(&self) -> RewardSignal {
        RewardSignal::Negative
    }
    fn clone_boxed(&self) -> BoxedRewardTerm {
        Box::new(self.clone())
    }
    fn measure(&self, transition: &Transition) -> f64 {
        if transition.blocked() { 1.0 } else { 0.0 }
    }
}

#[derive(Debug, Clone)]
pub struct GameOver;

impl RewardTerm for GameOver {
    fn id(&self) -> &'static str {
        "game_over"
    }
    fn name(&self) -> &'static str {
        "Game Over"
    }
    fn signal(&self) -> RewardSignal {
        RewardSignal::Negative
    }
    fn clone_boxed(&self) -> BoxedRewardTerm {
        Box::new(self.clone())
    }
    fn measure(&self, transition: &Transition) -> f64 {
        if transition.game_over() { 1.0 } else { 0.0 }
    }
}
