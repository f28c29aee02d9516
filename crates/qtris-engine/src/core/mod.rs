pub use self::{board::*, piece::*};

pub(crate) mod board;
mod collision;
pub(crate) mod piece;
