//! Deterministic falling-block game engine.
//!
//! The crate is split in two layers:
//!
//! - [`core`] - Immutable piece geometry, the board grid and collision checks
//! - [`engine`] - The turn-based game session, piece bag, actions and statistics
//!
//! Everything commonly used is re-exported at the crate root.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
