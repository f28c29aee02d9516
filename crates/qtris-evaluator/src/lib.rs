//! Reward model for scoring game steps.
//!
//! A step of a [`GameSession`](qtris_engine::GameSession) is captured as a
//! [`Transition`]: the settled board before and after, plus what happened in
//! between. The [`RewardEvaluator`] turns it into a scalar reward by summing
//! independent, weighted [`RewardTerm`]s.
//!
//! # Architecture
//!
//! ```text
//! RewardEvaluator (weighted sum, configured by RewardWeights)
//!     ↓ uses
//! RewardTerm (one magnitude + signal per term)
//!     ↓ reads
//! Transition → BoardAnalysis (lazy board metrics)
//! ```
//!
//! # Design Principles
//!
//! - **Terms measure, weights decide.** Each term returns a non-negative
//!   magnitude and declares whether it is a reward or a penalty. Which terms
//!   matter, and how much, is configuration.
//! - **Settled boards only.** Transitions compare boards without the falling
//!   piece, so a piece in mid-air never counts as a hole cover.
//! - **Lazy metrics.** [`BoardAnalysis`] computes each metric at most once and
//!   only when a term asks for it.

pub use self::{
    board_analysis::BoardAnalysis,
    reward_evaluator::{RewardEvaluator, RewardWeights, TermValue},
    reward_term::{BoxedRewardTerm, BumpinessMode, RewardSignal, RewardTerm},
    transition::Transition,
};

pub mod board_analysis;
pub mod reward_evaluator;
pub mod reward_term;
pub mod transition;
