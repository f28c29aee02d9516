use super::{board::Board, piece::Piece};

impl Board {
    /// Checks whether `candidate` would collide with the walls, the floor or
    /// any occupied cell once `ignoring` is removed from the board.
    ///
    /// `ignoring` must be the piece as it stood immediately before the move
    /// that produced `candidate`. Its cells are treated as empty, so a rotated
    /// or shifted candidate is never blocked by its own previous position.
    /// This is equivalent to testing against `self.without_piece(ignoring)`
    /// without cloning the board.
    ///
    /// # Example
    ///
    /// ```
    /// use qtris_engine::{Board, Occupancy, Piece, PieceCatalog, PieceKind};
    ///
    /// let catalog = PieceCatalog::standard();
    /// let mut board = Board::default();
    /// let piece = Piece::spawn(catalog, PieceKind::T, board.width());
    /// board.place(&piece, Occupancy::CurrentPiece);
    ///
    /// let rotated = piece.rotated_right(catalog);
    /// assert!(!board.would_collide(&rotated, &piece));
    /// ```
    #[must_use]
    pub fn would_collide(&self, candidate: &Piece, ignoring: &Piece) -> bool {
        candidate.cells().iter().any(|&position| {
            match self.get(position) {
                // floor, side walls (and the ceiling)
                None => true,
                Some(cell) => {
                    !cell.is_empty() && !ignoring.occupies(position.row, position.col)
                }
            }
        })
    }

    /// Checks `piece` against the board as it is, with nothing ignored.
    ///
    /// Used for a freshly spawned piece, which has no previous position.
    #[must_use]
    pub fn collides(&self, piece: &Piece) -> bool {
        piece
            .cells()
            .iter()
            .any(|&position| self.get(position).is_none_or(|cell| !cell.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{
        board::Occupancy,
        piece::{PieceCatalog, PieceKind, Position, Rotation},
    };

    use super::*;

    fn catalog() -> &'static PieceCatalog {
        PieceCatalog::standard()
    }

    #[test]
    fn test_spawn_on_empty_board_is_free() {
        let board = Board::default();
        for kind in PieceKind::ALL {
            let piece = Piece::spawn(catalog(), kind, board.width());
            assert!(!board.collides(&piece), "{kind:?} collides at spawn");
        }
    }

    #[test]
    fn test_walls_and_floor() {
        let board = Board::default();
        let piece = Piece::new(catalog(), PieceKind::O, Rotation::Deg0, Position::new(18, -1));
        // O occupies columns anchor+1..=anchor+2, rows anchor..=anchor+1
        assert!(!board.collides(&piece));
        assert!(board.would_collide(&piece.left(), &piece));
        assert!(board.would_collide(&piece.down(), &piece));

        let right = Piece::new(catalog(), PieceKind::O, Rotation::Deg0, Position::new(0, 7));
        assert!(!board.collides(&right));
        assert!(board.would_collide(&right.right(), &right));
    }

    #[test]
    fn test_locked_cells_block_moves() {
        let mut board = Board::default();
        let stack = Piece::new(catalog(), PieceKind::O, Rotation::Deg0, Position::new(18, 3));
        board.place(&stack, Occupancy::Locked);

        let falling = Piece::new(catalog(), PieceKind::O, Rotation::Deg0, Position::new(16, 3));
        board.place(&falling, Occupancy::CurrentPiece);
        assert!(board.would_collide(&falling.down(), &falling));
        assert!(!board.would_collide(&falling.left(), &falling));
        assert!(board.collides(&falling.down().down()));
    }

    #[test]
    fn test_rotation_ignores_previous_cells_only() {
        let mut board = Board::default();
        let piece = Piece::new(catalog(), PieceKind::I, Rotation::Deg0, Position::new(5, 3));
        board.place(&piece, Occupancy::CurrentPiece);

        // vertical I at column 4 overlaps the horizontal I at (5, 4)
        let rotated = piece.rotated_right(catalog());
        assert!(rotated.occupies(5, 4));
        assert!(!board.would_collide(&rotated, &piece));

        board.place(
            &Piece::new(catalog(), PieceKind::O, Rotation::Deg0, Position::new(7, 3)),
            Occupancy::Locked,
        );
        assert!(board.would_collide(&rotated, &piece));
        // ignoring the candidate instead hides the locked cells it overlaps
        assert!(!board.would_collide(&rotated, &rotated));
    }

    #[test]
    fn test_equivalent_to_without_piece() {
        let mut board = Board::default();
        let piece = Piece::new(catalog(), PieceKind::T, Rotation::Deg0, Position::new(10, 4));
        board.place(&piece, Occupancy::CurrentPiece);
        board.place(
            &Piece::new(catalog(), PieceKind::O, Rotation::Deg0, Position::new(12, 3)),
            Occupancy::Locked,
        );
        let snapshot = board.without_piece(&piece);
        let empty_ignore =
            Piece::new(catalog(), PieceKind::O, Rotation::Deg0, Position::new(-9, -9));

        for candidate in [
            piece.down(),
            piece.down().down(),
            piece.left(),
            piece.rotated_right(catalog()),
        ] {
            assert_eq!(
                board.would_collide(&candidate, &piece),
                snapshot.would_collide(&candidate, &empty_ignore),
                "{candidate}"
            );
        }
    }
}
