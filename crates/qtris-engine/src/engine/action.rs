use serde::{Deserialize, Serialize};

/// One agent input per step, applied before the automatic move down.
///
/// The variant order of [`Action::ALL`] is fixed: value tables index actions
/// by it and resolve ties in that order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
pub enum Action {
    #[display("left")]
    MoveLeft,
    #[display("right")]
    MoveRight,
    #[display("rotate")]
    Rotate,
    #[default]
    #[display("none")]
    None,
}

impl Action {
    pub const LEN: usize = 4;

    pub const ALL: [Self; Self::LEN] = [Self::MoveLeft, Self::MoveRight, Self::Rotate, Self::None];

    /// Position of the action in [`Action::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, action) in Action::ALL.into_iter().enumerate() {
            assert_eq!(action.index(), i);
        }
    }

    #[test]
    fn test_serialized_by_name() {
        let json = serde_json::to_string(&Action::ALL).unwrap();
        assert_eq!(json, r#"["MoveLeft","MoveRight","Rotate","None"]"#);
        let back: Vec<Action> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Action::ALL);
    }
}
