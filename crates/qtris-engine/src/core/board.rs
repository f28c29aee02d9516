use std::fmt;

use super::piece::{Piece, PieceKind, Position};

/// A single cell of the board.
///
/// The piece kind is carried only so renderers can color the cell; game logic
/// looks at the three-way state through [`Cell::is_empty`] and [`Cell::is_locked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    /// Empty cell (no piece).
    #[default]
    Empty,
    /// Part of a piece that has been locked into the stack.
    Locked(PieceKind),
    /// Part of the piece currently falling.
    CurrentPiece(PieceKind),
}

impl Cell {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, Cell::Locked(_))
    }

    #[must_use]
    pub fn is_current_piece(self) -> bool {
        matches!(self, Cell::CurrentPiece(_))
    }

    #[must_use]
    pub fn kind(self) -> Option<PieceKind> {
        match self {
            Cell::Empty => None,
            Cell::Locked(kind) | Cell::CurrentPiece(kind) => Some(kind),
        }
    }

    fn as_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Locked(_) => '#',
            Cell::CurrentPiece(_) => '@',
        }
    }
}

/// How a piece is written onto the board by [`Board::place`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Locked,
    CurrentPiece,
}

/// Fixed-size grid of cells, `height` rows × `width` columns, row 0 at the top.
///
/// The board stores both the locked stack and the falling piece (as
/// [`Cell::CurrentPiece`]). Feature scans count every non-empty cell, so callers
/// that want "the stack without the falling piece" use [`Board::without_piece`].
///
/// # Example
///
/// ```
/// use qtris_engine::Board;
///
/// let board = Board::from_ascii(
///     "
///     ..........
///     #.........
///     ###.#######
///     ",
/// );
/// assert_eq!(board.height(), 3);
/// assert_eq!(board.hole_count(), 0);
/// assert_eq!(board.column_height(0), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Board {
    pub const DEFAULT_WIDTH: usize = 10;
    pub const DEFAULT_HEIGHT: usize = 20;

    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    /// Creates a board from ASCII art, top row first.
    ///
    /// `#` is a locked cell, `@` a current-piece cell and `.` an empty cell. Blank
    /// lines are skipped and every row must have the same width. Locked and
    /// current-piece cells built this way carry [`PieceKind::I`].
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let rows: Vec<Vec<Cell>> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.chars()
                    .filter_map(|c| match c {
                        '#' => Some(Cell::Locked(PieceKind::I)),
                        '@' => Some(Cell::CurrentPiece(PieceKind::I)),
                        '.' => Some(Cell::Empty),
                        _ => None,
                    })
                    .collect()
            })
            .collect();
        let width = rows.first().map_or(0, Vec::len);
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(
                row.len(),
                width,
                "Each row must have exactly {width} cells, got {} at row {y}",
                row.len()
            );
        }
        Self {
            width,
            height: rows.len(),
            cells: rows.into_iter().flatten().collect(),
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the cell at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the board.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        assert!(row < self.height && col < self.width);
        self.cells[row * self.width + col]
    }

    /// Returns the cell at a signed position, or `None` outside the board.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<Cell> {
        self.index_of(position).map(|i| self.cells[i])
    }

    /// Iterates over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks_exact(self.width.max(1))
    }

    pub(crate) fn index_of(&self, position: Position) -> Option<usize> {
        let row = usize::try_from(position.row).ok()?;
        let col = usize::try_from(position.col).ok()?;
        (row < self.height && col < self.width).then(|| row * self.width + col)
    }

    fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row * self.width..][..self.width]
    }

    /// Writes the piece's four cells with the given occupancy.
    ///
    /// Every cell must be inside the board; callers validate the placement with
    /// [`Board::would_collide`] first. Violating this is a programming error: it
    /// panics in debug builds and leaves the board untouched in release builds.
    pub fn place(&mut self, piece: &Piece, occupancy: Occupancy) {
        let indices = self.piece_indices(piece);
        debug_assert!(indices.is_some(), "piece {piece} placed outside the board");
        let Some(indices) = indices else {
            return;
        };
        let cell = match occupancy {
            Occupancy::Locked => Cell::Locked(piece.kind()),
            Occupancy::CurrentPiece => Cell::CurrentPiece(piece.kind()),
        };
        for i in indices {
            self.cells[i] = cell;
        }
    }

    /// Resets the piece's cells to empty. Cells outside the board are ignored.
    pub fn clear(&mut self, piece: &Piece) {
        for position in piece.cells() {
            if let Some(i) = self.index_of(*position) {
                self.cells[i] = Cell::Empty;
            }
        }
    }

    fn piece_indices(&self, piece: &Piece) -> Option<[usize; 4]> {
        let [a, b, c, d] = *piece.cells();
        Some([
            self.index_of(a)?,
            self.index_of(b)?,
            self.index_of(c)?,
            self.index_of(d)?,
        ])
    }

    /// Returns a copy of the board with the piece's cells reset to empty.
    #[must_use]
    pub fn without_piece(&self, piece: &Piece) -> Self {
        let mut board = self.clone();
        board.clear(piece);
        board
    }

    fn is_row_complete(&self, row: usize) -> bool {
        self.row(row).iter().all(|c| c.is_locked())
    }

    /// Removes every complete row and returns how many were removed.
    ///
    /// A row is complete when all its cells are locked; cells of the falling
    /// piece never complete a row. Remaining rows keep their relative order and
    /// the same number of empty rows is inserted at the top.
    pub fn clear_complete_lines(&mut self) -> usize {
        let width = self.width;
        let mut count = 0;
        for y in (0..self.height).rev() {
            if self.is_row_complete(y) {
                count += 1;
                continue;
            }
            if count > 0 {
                self.cells
                    .copy_within(y * width..(y + 1) * width, (y + count) * width);
            }
        }
        self.cells[..count * width].fill(Cell::Empty);
        count
    }

    /// Distance from the top of the board to the first non-empty cell, or 0.
    #[must_use]
    pub fn column_height(&self, col: usize) -> usize {
        (0..self.height)
            .find(|&row| !self.cell(row, col).is_empty())
            .map_or(0, |row| self.height - row)
    }

    #[must_use]
    pub fn column_heights(&self) -> Vec<usize> {
        (0..self.width).map(|col| self.column_height(col)).collect()
    }

    #[must_use]
    pub fn max_height(&self) -> usize {
        self.column_heights().into_iter().max().unwrap_or(0)
    }

    #[must_use]
    pub fn sum_of_heights(&self) -> usize {
        self.column_heights().into_iter().sum()
    }

    /// Number of empty cells with at least one non-empty cell above them.
    #[must_use]
    pub fn hole_count(&self) -> usize {
        let mut holes = 0;
        for col in 0..self.width {
            let mut covered = false;
            for row in 0..self.height {
                if self.cell(row, col).is_empty() {
                    if covered {
                        holes += 1;
                    }
                } else {
                    covered = true;
                }
            }
        }
        holes
    }

    /// Sum of absolute height differences between adjacent columns.
    #[must_use]
    pub fn bumpiness(&self) -> usize {
        self.column_heights()
            .windows(2)
            .map(|w| w[0].abs_diff(w[1]))
            .sum()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for cell in row {
                write!(f, "{}", cell.as_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::piece::{PieceCatalog, Rotation};

    use super::*;

    fn locked_rows(board: &Board) -> Vec<String> {
        board.to_string().lines().map(str::to_owned).collect()
    }

    #[test]
    fn test_initial_board() {
        let board = Board::default();
        assert_eq!(board.width(), 10);
        assert_eq!(board.height(), 20);
        assert!(board.rows().flatten().all(|c| c.is_empty()));
        assert_eq!(board.rows().count(), 20);
    }

    #[test]
    fn test_from_ascii_and_display() {
        let art = "\
..@.
#..#
####
";
        let board = Board::from_ascii(art);
        assert_eq!(board.width(), 4);
        assert_eq!(board.height(), 3);
        assert!(board.cell(0, 2).is_current_piece());
        assert!(board.cell(1, 0).is_locked());
        assert_eq!(board.to_string(), art);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let board = Board::new(4, 4);
        assert_eq!(board.get(Position::new(0, 0)), Some(Cell::Empty));
        assert_eq!(board.get(Position::new(-1, 0)), None);
        assert_eq!(board.get(Position::new(0, 4)), None);
        assert_eq!(board.get(Position::new(4, 0)), None);
    }

    #[test]
    fn test_place_and_clear_piece() {
        let catalog = PieceCatalog::standard();
        let mut board = Board::default();
        let piece = Piece::spawn(catalog, PieceKind::T, board.width());

        board.place(&piece, Occupancy::CurrentPiece);
        assert_eq!(
            board.rows().flatten().filter(|c| c.is_current_piece()).count(),
            4
        );
        for p in piece.cells() {
            assert_eq!(board.get(*p), Some(Cell::CurrentPiece(PieceKind::T)));
        }

        board.clear(&piece);
        assert!(board.rows().flatten().all(|c| c.is_empty()));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "placed outside the board"))]
    fn test_place_out_of_bounds_is_contract_error() {
        let catalog = PieceCatalog::standard();
        let mut board = Board::new(10, 20);
        let piece = Piece::new(catalog, PieceKind::I, Rotation::Deg0, Position::new(0, 8));
        board.place(&piece, Occupancy::Locked);
        assert!(board.rows().flatten().all(|c| c.is_empty()));
    }

    #[test]
    fn test_without_piece_leaves_original_untouched() {
        let catalog = PieceCatalog::standard();
        let mut board = Board::default();
        let piece = Piece::spawn(catalog, PieceKind::O, board.width());
        board.place(&piece, Occupancy::CurrentPiece);

        let snapshot = board.without_piece(&piece);
        assert!(snapshot.rows().flatten().all(|c| c.is_empty()));
        assert_eq!(
            board.rows().flatten().filter(|c| !c.is_empty()).count(),
            4
        );
    }

    #[test]
    fn test_column_heights() {
        let board = Board::from_ascii(
            "
            ....
            .#..
            .#.#
            ##.#
            ",
        );
        assert_eq!(board.column_heights(), vec![1, 3, 0, 2]);
        assert_eq!(board.max_height(), 3);
        assert_eq!(board.sum_of_heights(), 6);
        assert_eq!(board.bumpiness(), 2 + 3 + 2);
    }

    #[test]
    fn test_hole_count() {
        let board = Board::from_ascii(
            "
            .#..
            ....
            .#.#
            #..#
            ",
        );
        // column 1: rows 1 and 3 are covered; column 3: none
        assert_eq!(board.hole_count(), 2);
        assert_eq!(Board::default().hole_count(), 0);
    }

    #[test]
    fn test_clear_lines_single_line() {
        let mut board = Board::from_ascii(
            "
            ....
            #...
            ####
            ",
        );
        assert_eq!(board.clear_complete_lines(), 1);
        assert_eq!(locked_rows(&board), ["....", "....", "#..."]);
        assert_eq!(board.height(), 3);
    }

    #[test]
    fn test_clear_lines_non_adjacent() {
        let mut board = Board::from_ascii(
            "
            #...
            ####
            .#..
            ####
            ..#.
            ",
        );
        assert_eq!(board.clear_complete_lines(), 2);
        assert_eq!(
            locked_rows(&board),
            ["....", "....", "#...", ".#..", "..#."]
        );
        assert_eq!(board.clear_complete_lines(), 0);
    }

    #[test]
    fn test_clear_lines_all_filled() {
        let mut board = Board::from_ascii(
            "
            ####
            ####
            ",
        );
        assert_eq!(board.clear_complete_lines(), 2);
        assert!(board.rows().flatten().all(|c| c.is_empty()));
    }

    #[test]
    fn test_falling_piece_does_not_complete_a_row() {
        let mut board = Board::from_ascii(
            "
            ....
            ##@@
            ",
        );
        assert_eq!(board.clear_complete_lines(), 0);
        assert!(board.cell(1, 2).is_current_piece());
    }
}
