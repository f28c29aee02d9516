//! Compact learning state of a game position.
//!
//! A [`StateKey`] describes the falling piece together with a small window of
//! the board directly below it (the "radar"). Everything outside the window is
//! dropped, so distinct board configurations that look the same locally share
//! one key. This aliasing is how the agent generalizes across positions.

use qtris_engine::{
    BlockOffset, Board, BoardConfig, GameSession, Piece, PieceCatalog, PieceKind, Position,
    Rotation,
};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, RadarConfig};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub kind: PieceKind,
    pub rotation: Rotation,
    /// Block offsets of the piece relative to its anchor.
    pub offsets: [BlockOffset; 4],
    /// One bitmask per radar row, top row first; bit `i` is column `i` of the window.
    pub radar: Vec<u64>,
    /// Column of the piece's leftmost block relative to the window's left edge.
    pub column_offset: i16,
    pub anchor_row: i16,
}

/// Builds [`StateKey`]s for one board size and radar shape.
///
/// # Example
///
/// ```
/// use qtris_agent::{RadarConfig, StateEncoder};
/// use qtris_engine::{BoardConfig, GameSession};
///
/// let board = BoardConfig::default();
/// let encoder = StateEncoder::new(RadarConfig::default(), &board).unwrap();
/// let session = GameSession::new(board);
///
/// let key = encoder.encode(&session);
/// assert_eq!(key.radar.len(), 3);
/// assert_eq!(key.anchor_row, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEncoder {
    radar: RadarConfig,
    board: BoardConfig,
    catalog: &'static PieceCatalog,
}

impl StateEncoder {
    pub fn new(radar: RadarConfig, board: &BoardConfig) -> Result<Self, ConfigError> {
        radar.validate(board)?;
        Ok(Self {
            radar,
            board: *board,
            catalog: PieceCatalog::standard(),
        })
    }

    #[must_use]
    pub fn radar(&self) -> &RadarConfig {
        &self.radar
    }

    #[must_use]
    pub fn board_config(&self) -> &BoardConfig {
        &self.board
    }

    /// Whether `key` has this encoder's radar shape: one row per radar row and
    /// no bits outside the window.
    #[must_use]
    pub fn fits_radar(&self, key: &StateKey) -> bool {
        let outside = !full_mask(self.radar.width);
        key.radar.len() == self.radar.depth && key.radar.iter().all(|mask| mask & outside == 0)
    }

    #[must_use]
    pub fn encode(&self, session: &GameSession) -> StateKey {
        self.encode_piece(session.board(), session.falling_piece())
    }

    /// Encodes `piece` against `board`.
    ///
    /// Only locked cells are read, so the board may still contain the piece
    /// as current-piece cells.
    #[must_use]
    pub fn encode_piece(&self, board: &Board, piece: &Piece) -> StateKey {
        let left = self.window_left(piece);
        let (min_col, _) = piece.column_span();
        let top = piece.bottom_row() + 1;
        let radar = (0..self.radar.depth)
            .map(|d| self.row_mask(board, top + to_i16(d), left))
            .collect();

        StateKey {
            kind: piece.kind(),
            rotation: piece.rotation(),
            offsets: *self.catalog.shape(piece.kind(), piece.rotation()),
            radar,
            column_offset: min_col - left,
            anchor_row: piece.anchor().row,
        }
    }

    /// Left edge of a window centered on the piece and clamped inside the board.
    fn window_left(&self, piece: &Piece) -> i16 {
        let (min_col, max_col) = piece.column_span();
        let span = max_col - min_col + 1;
        let width = to_i16(self.radar.width);
        let centered = min_col - (width - span).div_euclid(2);
        centered.clamp(0, to_i16(self.board.width) - width)
    }

    fn row_mask(&self, board: &Board, row: i16, left: i16) -> u64 {
        let width = self.radar.width;
        if usize::try_from(row).is_ok_and(|r| r >= board.height()) {
            // below the floor
            return full_mask(width);
        }
        (0..width)
            .filter(|&i| {
                let position = Position::new(row, left + to_i16(i));
                board.get(position).is_some_and(|cell| cell.is_locked())
            })
            .fold(0, |mask, i| mask | (1 << i))
    }
}

fn full_mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

fn to_i16(n: usize) -> i16 {
    i16::try_from(n).unwrap_or(i16::MAX)
}
