use qtris_engine::Board;
use serde::{Deserialize, Serialize};

use crate::{
    reward_term::{BoxedRewardTerm, BumpinessMode, all_reward_terms},
    transition::Transition,
};

/// Weight of each reward term, plus the bumpiness measurement mode.
///
/// No combination is canonical: every weight is a configuration choice and a
/// weight of zero disables its term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub lines_cleared: f64,
    pub piece_depth: f64,
    pub new_holes: f64,
    pub bumpiness: f64,
    pub blocked_move: f64,
    pub game_over: f64,
    pub bumpiness_mode: BumpinessMode,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            lines_cleared: 1.0,
            piece_depth: 0.5,
            new_holes: 1.0,
            bumpiness: 0.2,
            blocked_move: 0.1,
            game_over: 2.0,
            bumpiness_mode: BumpinessMode::Increase,
        }
    }
}

impl RewardWeights {
    /// Returns the weight for a term id, or `None` for an unknown id.
    #[must_use]
    pub fn weight(&self, term_id: &str) -> Option<f64> {
        let weight = match term_id {
            "lines_cleared" => self.lines_cleared,
            "piece_depth" => self.piece_depth,
            "new_holes" => self.new_holes,
            "bumpiness" => self.bumpiness,
            "blocked_move" => self.blocked_move,
            "game_over" => self.game_over,
            _ => return None,
        };
        Some(weight)
    }
}

/// Contribution of one term to a reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermValue {
    pub magnitude: f64,
    pub weighted: f64,
}

/// Weighted sum of independent reward terms.
///
/// `evaluate(t) = Σ weight · sign · magnitude` over all terms. Evaluation is a
/// pure function of the transition.
///
/// # Example
///
/// ```
/// use qtris_engine::Board;
/// use qtris_evaluator::{RewardEvaluator, RewardWeights};
///
/// let evaluator = RewardEvaluator::from_weights(&RewardWeights::default());
/// let board = Board::default();
/// let clear = evaluator.evaluate_boards(&board, &board, 2);
/// let nothing = evaluator.evaluate_boards(&board, &board, 0);
/// assert!(clear > nothing);
/// ```
#[derive(Debug, Clone)]
pub struct RewardEvaluator {
    terms: Vec<(BoxedRewardTerm, f64)>,
}

impl Default for RewardEvaluator {
    fn default() -> Self {
        Self::from_weights(&RewardWeights::default())
    }
}

impl RewardEvaluator {
    #[must_use]
    pub fn from_weights(weights: &RewardWeights) -> Self {
        let terms = all_reward_terms(weights.bumpiness_mode)
            .into_iter()
            .filter_map(|term| {
                let weight = weights.weight(term.id())?;
                Some((term, weight))
            })
            .collect();
        Self { terms }
    }

    #[must_use]
    pub fn evaluate(&self, transition: &Transition) -> f64 {
        self.breakdown(transition).map(|(_, v)| v.weighted).sum()
    }

    /// Per-term values of a transition, in term order.
    pub fn breakdown<'a>(
        &'a self,
        transition: &'a Transition,
    ) -> impl Iterator<Item = (&'a BoxedRewardTerm, TermValue)> + 'a {
        self.terms.iter().map(|(term, weight)| {
            let magnitude = term.measure(transition);
            let weighted = weight * term.signal().sign() * magnitude;
            (
                term,
                TermValue {
                    magnitude,
                    weighted,
                },
            )
        })
    }

    /// Scores a transition known only by its settled boards and cleared lines.
    #[must_use]
    pub fn evaluate_boards(&self, before: &Board, after: &Board, cleared_lines: usize) -> f64 {
        self.evaluate(&Transition::new(
            before.clone(),
            after.clone(),
            cleared_lines,
        ))
    }
}

#[cfg(test)]
mod tests {
    use qtris_engine::{Action, BagSeed, BoardConfig, GameSession};

    use super::*;

    #[test]
    fn test_two_lines_beat_zero_lines() {
        let evaluator = RewardEvaluator::default();
        let before = Board::from_ascii(
            "
            ....
            ....
            #...
            ##..
            ",
        );
        let after = Board::from_ascii(
            "
            ....
            ....
            #...
            ##..
            ",
        );
        let a = evaluator.evaluate_boards(&before, &after, 2);
        let b = evaluator.evaluate_boards(&before, &after, 0);
        assert!(a > b);
        assert!((a - b - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_penalties_are_negative() {
        let evaluator = RewardEvaluator::default();
        let before = Board::from_ascii(
            "
            ....
            ....
            ....
            ....
            ",
        );
        let after = Board::from_ascii(
            "
            ....
            ##..
            .#..
            .#..
            ",
        );
        let t = Transition::new(before, after, 0);
        let values: Vec<_> = evaluator.breakdown(&t).collect();
        let holes = values.iter().find(|(term, _)| term.id() == "new_holes").unwrap().1;
        assert!((holes.magnitude - 2.0).abs() < f64::EPSILON);
        assert!((holes.weighted + 2.0).abs() < f64::EPSILON);
        assert!(evaluator.evaluate(&t) < 0.0);
    }

    #[test]
    fn test_breakdown_names_every_weighted_term() {
        let evaluator = RewardEvaluator::default();
        let t = Transition::new(Board::default(), Board::default(), 0);
        let names: Vec<_> = evaluator.breakdown(&t).map(|(term, _)| term.name()).collect();
        assert_eq!(
            names,
            [
                "Lines Cleared",
                "Piece Depth",
                "New Holes",
                "Surface Bumpiness",
                "Blocked Move",
                "Game Over",
            ]
        );
    }

    #[test]
    fn test_zero_weights_disable_terms() {
        let weights = RewardWeights {
            lines_cleared: 0.0,
            piece_depth: 0.0,
            new_holes: 0.0,
            bumpiness: 0.0,
            blocked_move: 0.0,
            game_over: 0.0,
            bumpiness_mode: BumpinessMode::Absolute,
        };
        let evaluator = RewardEvaluator::from_weights(&weights);
        let board = Board::from_ascii("#...\n##..\n");
        assert!(evaluator.evaluate_boards(&board, &board, 4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weights_deserialize_with_defaults() {
        let weights: RewardWeights =
            serde_json::from_str(r#"{"game_over": 10.0, "bumpiness_mode": "absolute"}"#).unwrap();
        assert!((weights.game_over - 10.0).abs() < f64::EPSILON);
        assert_eq!(weights.bumpiness_mode, BumpinessMode::Absolute);
        assert!((weights.lines_cleared - RewardWeights::default().lines_cleared).abs() < f64::EPSILON);
    }

    #[test]
    fn test_step_transition_is_scored() {
        let evaluator = RewardEvaluator::default();
        let mut session = GameSession::with_seed(BoardConfig::default(), BagSeed::from_u128(9));
        // push the piece into the left wall until a move is rejected
        let mut blocked = None;
        for _ in 0..10 {
            let before = session.settled_board();
            let report = session.apply(Action::MoveLeft);
            let transition = Transition::from_step(before, session.settled_board(), &report);
            if report.blocked() {
                blocked = Some(evaluator.evaluate(&transition));
                break;
            }
        }
        let reward = blocked.expect("the wall is reached within ten steps");
        assert!((reward + 0.1).abs() < 1e-12);
    }
}
