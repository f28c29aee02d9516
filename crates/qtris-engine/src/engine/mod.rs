//! Game engine logic and state management.
//!
//! This module drives the core data structures through one game:
//!
//! - [`GameSession`] - The turn-based state machine (board, falling piece, bag, stats)
//! - [`Action`] - The four inputs an agent may issue each step
//! - [`GameStats`] - Game statistics (locked pieces, lines cleared, score)
//! - [`PieceBag`] - 7-bag piece generation system
//! - [`BagSeed`] - Seed for deterministic piece generation
//!
//! # Game Flow
//!
//! 1. Create a [`GameSession`]; the first piece spawns at the top of the board
//! 2. Each step applies one [`Action`] and then moves the piece down one row
//! 3. A piece that cannot move down is locked, complete lines are cleared and
//!    the next piece spawns
//! 4. The game is over once a freshly spawned piece collides
//!
//! # Example
//!
//! ```
//! use qtris_engine::{Action, BoardConfig, GameSession};
//!
//! let mut session = GameSession::new(BoardConfig::default());
//!
//! while !session.state().is_game_over() {
//!     session.apply(Action::None);
//! }
//! assert!(session.stats().completed_pieces() > 0);
//! ```

pub use self::{action::*, bag::*, game_session::*, game_stats::*};

mod action;
mod bag;
mod game_session;
mod game_stats;
