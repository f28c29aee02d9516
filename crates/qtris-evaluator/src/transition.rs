//! The observable outcome of one session step.
//!
//! A [`Transition`] pairs the settled board before a step with the settled
//! board after it, together with what happened in between (cleared lines, the
//! piece that locked, whether the action was rejected and whether the game
//! ended). Reward terms read everything they need from here.

use qtris_engine::{Board, Piece, StepReport};

use crate::board_analysis::BoardAnalysis;

#[derive(Debug)]
pub struct Transition {
    before: BoardAnalysis,
    after: BoardAnalysis,
    cleared_lines: usize,
    locked_piece: Option<Piece>,
    blocked: bool,
    game_over: bool,
}

impl Transition {
    /// A transition known only by its boards and cleared line count.
    ///
    /// Both boards must be settled: the falling piece is not part of them.
    #[must_use]
    pub fn new(before: Board, after: Board, cleared_lines: usize) -> Self {
        Self {
            before: BoardAnalysis::new(before),
            after: BoardAnalysis::new(after),
            cleared_lines,
            locked_piece: None,
            blocked: false,
            game_over: false,
        }
    }

    /// Builds the transition of one [`GameSession::apply`](qtris_engine::GameSession::apply) call.
    #[must_use]
    pub fn from_step(before: Board, after: Board, report: &StepReport) -> Self {
        let lock = report.outcome.lock();
        Self {
            locked_piece: lock.map(|l| l.piece),
            blocked: report.blocked(),
            game_over: report.game_over(),
            ..Self::new(before, after, report.cleared_lines())
        }
    }

    #[must_use]
    pub fn with_locked_piece(mut self, piece: Piece) -> Self {
        self.locked_piece = Some(piece);
        self
    }

    #[must_use]
    pub fn before(&self) -> &BoardAnalysis {
        &self.before
    }

    #[must_use]
    pub fn after(&self) -> &BoardAnalysis {
        &self.after
    }

    #[must_use]
    pub fn cleared_lines(&self) -> usize {
        self.cleared_lines
    }

    /// The piece that locked during the step, with its pre-clear cells.
    #[must_use]
    pub fn locked_piece(&self) -> Option<&Piece> {
        self.locked_piece.as_ref()
    }

    #[must_use]
    pub fn blocked(&self) -> bool {
        self.blocked
    }

    #[must_use]
    pub fn game_over(&self) -> bool {
        self.game_over
    }
}
