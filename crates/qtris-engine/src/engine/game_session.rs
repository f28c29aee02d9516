use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Board, Occupancy, Piece, PieceCatalog, PieceKind};

use super::{Action, BagSeed, GameStats, PieceBag};

/// Board dimensions of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: Board::DEFAULT_WIDTH,
            height: Board::DEFAULT_HEIGHT,
        }
    }
}

/// Observable state of a session between calls.
///
/// Spawning, locking and line clearing all happen inside a single
/// [`GameSession::move_down`] call and are reported through [`DropOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SessionState {
    Falling,
    GameOver,
}

/// A piece that was written into the board as locked cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockReport {
    /// The piece as it was locked, before any line was cleared.
    pub piece: Piece,
    pub cleared_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum DropOutcome {
    /// The falling piece moved down one row.
    Moved,
    /// The falling piece locked and the next piece spawned.
    Locked(LockReport),
    /// The falling piece locked and the next piece collided at spawn.
    ToppedOut(LockReport),
    /// The session was already over; nothing happened.
    Halted,
}

impl DropOutcome {
    /// The lock that happened during this drop, if any.
    #[must_use]
    pub fn lock(&self) -> Option<&LockReport> {
        match self {
            Self::Locked(report) | Self::ToppedOut(report) => Some(report),
            Self::Moved | Self::Halted => None,
        }
    }
}

/// Result of one [`GameSession::apply`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub action: Action,
    /// Whether the action itself changed the falling piece.
    pub moved: bool,
    pub outcome: DropOutcome,
}

impl StepReport {
    /// A lateral move or rotation that was rejected by collision.
    #[must_use]
    pub fn blocked(&self) -> bool {
        !self.action.is_none() && !self.moved
    }

    #[must_use]
    pub fn cleared_lines(&self) -> usize {
        self.outcome.lock().map_or(0, |lock| lock.cleared_lines)
    }

    /// Whether this step ended the game.
    #[must_use]
    pub fn game_over(&self) -> bool {
        self.outcome.is_topped_out()
    }
}

/// A single game: board, falling piece, bag and statistics.
///
/// The falling piece is always present on the board as
/// [`Cell::CurrentPiece`](crate::Cell::CurrentPiece) cells while the session is
/// [`SessionState::Falling`]. Once the session is over every mutator is a
/// no-op until [`GameSession::reset`].
#[derive(Debug, Clone)]
pub struct GameSession {
    config: BoardConfig,
    catalog: &'static PieceCatalog,
    board: Board,
    falling_piece: Piece,
    bag: PieceBag,
    stats: GameStats,
    state: SessionState,
}

impl GameSession {
    /// Starts a session with a random bag seed.
    #[must_use]
    pub fn new(config: BoardConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    #[must_use]
    pub fn with_seed(config: BoardConfig, seed: BagSeed) -> Self {
        Self::with_board(Board::new(config.width, config.height), seed)
    }

    /// Starts a session on a pre-filled board.
    ///
    /// The board must not contain current-piece cells. If the first piece
    /// collides at its spawn position the session starts out game over.
    #[must_use]
    pub fn with_board(board: Board, seed: BagSeed) -> Self {
        let config = BoardConfig {
            width: board.width(),
            height: board.height(),
        };
        let catalog = PieceCatalog::standard();
        let mut bag = PieceBag::with_seed(seed);
        let falling_piece = Piece::spawn(catalog, bag.pop_next(), config.width);
        let mut this = Self {
            config,
            catalog,
            board,
            falling_piece,
            bag,
            stats: GameStats::new(),
            state: SessionState::Falling,
        };
        this.enter_piece(falling_piece);
        this
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &'static PieceCatalog {
        self.catalog
    }

    /// The board, including the falling piece as current-piece cells.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The piece in play; after game over, the piece that failed to spawn.
    #[must_use]
    pub fn falling_piece(&self) -> &Piece {
        &self.falling_piece
    }

    /// The board with only locked cells: the falling piece is left out.
    #[must_use]
    pub fn settled_board(&self) -> Board {
        match self.state {
            SessionState::Falling => self.board.without_piece(&self.falling_piece),
            SessionState::GameOver => self.board.clone(),
        }
    }

    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.next_pieces()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Clears the board and statistics and spawns the next piece from the bag.
    ///
    /// The bag keeps its random stream, so successive games differ.
    pub fn reset(&mut self) {
        self.board = Board::new(self.config.width, self.config.height);
        self.stats = GameStats::new();
        self.state = SessionState::Falling;
        self.spawn_next();
    }

    pub fn try_move_left(&mut self) -> bool {
        self.try_replace(self.falling_piece.left())
    }

    pub fn try_move_right(&mut self) -> bool {
        self.try_replace(self.falling_piece.right())
    }

    /// Rotates the falling piece 90° clockwise. There are no wall kicks.
    pub fn try_rotate(&mut self) -> bool {
        self.try_replace(self.falling_piece.rotated_right(self.catalog))
    }

    /// Moves the falling piece one row down, locking it if it cannot move.
    pub fn move_down(&mut self) -> DropOutcome {
        if self.state.is_game_over() {
            return DropOutcome::Halted;
        }
        if self.try_replace(self.falling_piece.down()) {
            return DropOutcome::Moved;
        }

        let piece = self.falling_piece;
        self.board.place(&piece, Occupancy::Locked);
        let cleared_lines = self.board.clear_complete_lines();
        self.stats.complete_piece_drop(cleared_lines);
        debug!(%piece, cleared_lines, score = self.stats.score(), "piece locked");

        let report = LockReport {
            piece,
            cleared_lines,
        };
        if self.spawn_next() {
            DropOutcome::Locked(report)
        } else {
            DropOutcome::ToppedOut(report)
        }
    }

    /// Applies one agent step: the action (if any), then one move down.
    pub fn apply(&mut self, action: Action) -> StepReport {
        let moved = match action {
            Action::MoveLeft => self.try_move_left(),
            Action::MoveRight => self.try_move_right(),
            Action::Rotate => self.try_rotate(),
            Action::None => false,
        };
        let outcome = self.move_down();
        StepReport {
            action,
            moved,
            outcome,
        }
    }

    fn try_replace(&mut self, candidate: Piece) -> bool {
        if self.state.is_game_over() || self.board.would_collide(&candidate, &self.falling_piece)
        {
            return false;
        }
        self.board.clear(&self.falling_piece);
        self.board.place(&candidate, Occupancy::CurrentPiece);
        self.falling_piece = candidate;
        true
    }

    fn spawn_next(&mut self) -> bool {
        let kind = self.bag.pop_next();
        let piece = Piece::spawn(self.catalog, kind, self.config.width);
        self.enter_piece(piece)
    }

    fn enter_piece(&mut self, piece: Piece) -> bool {
        self.falling_piece = piece;
        if self.board.collides(&piece) {
            debug!(%piece, pieces = self.stats.completed_pieces(), "game over");
            self.state = SessionState::GameOver;
            return false;
        }
        self.board.place(&piece, Occupancy::CurrentPiece);
        true
    }
}
